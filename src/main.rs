fn main() {
    tabletop_session::cli::run();
}
