fn main() {
    if let Err(err) = vizier::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
