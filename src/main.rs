fn main() {
    if let Err(err) = gexf_viz::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
