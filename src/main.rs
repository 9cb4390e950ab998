fn main() {
    kriegspiel::cli::init_logging();
    let args: Vec<String> = std::env::args().collect();
    std::process::exit(kriegspiel::cli::run_with_args(&args));
}
