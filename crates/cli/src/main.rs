fn main() -> Result<(), Box<dyn std::error::Error>> {
    jstubs_cli::run()
}
