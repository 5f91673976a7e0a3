use cdkit::commands;
use cdkit::efm;

mod cli;

fn main() -> Result<(),Box<dyn std::error::Error>> {
    let matches = cli::build_cli().get_matches();
    let (name,cmd) = matches.subcommand().expect("subcommand required");
    let mut logger = env_logger::Builder::from_default_env();
    if cmd.get_flag("verbose") {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();
    // the modulation tables are data; refuse to run if they got corrupted
    efm::verify_tables()?;
    match name {
        "encode" => commands::encode::encode(cmd),
        "analyze" => commands::analyze::analyze(cmd),
        "parsecsv" => commands::parsecsv::parsecsv(cmd),
        "mkraw" => commands::mkraw::mkraw(cmd),
        _ => {
            eprintln!("unknown subcommand");
            Err(Box::new(commands::CommandError::InvalidCommand))
        }
    }
}
