fn main() {
    if let Err(e) = peanut::cli::main() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
