// This binary crate is intentionally minimal.
// All training-engine logic lives in the library (src/lib.rs and its modules).
// Run demos with:
//   cargo run --example xor
fn main() {
    println!("magnetite-nn: a from-scratch neural network training engine in Rust.");
    println!("Run `cargo run --example xor` to see the XOR demo.");
    println!("Run `cargo run --example experiments` to sweep a few learning rates.");
}
