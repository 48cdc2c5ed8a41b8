fn main() {
    docfill::app::cli::run();
}
