//! # Command Line Interface
//!
//! Builds the clap command tree; the subcommands themselves run in the
//! `commands` module.

use clap::{Arg,ArgAction,ArgGroup,Command,ValueHint,crate_version,value_parser};

pub fn build_cli() -> Command {
    let long_help = "cdkit is always invoked with exactly one of several subcommands.
The subcommands are designed to function as nodes in a pipeline.
Set RUST_LOG environment variable to control logging level.
  levels: trace,debug,info,warn,error

Examples:
---------
make a test pattern:     `cdkit mkraw -p rows -n 10 -o test2.raw`
encode audio to EFM:     `cdkit encode -i test2.raw -e stream.efm`
encode a data track:     `cdkit encode -i track.raw -d -p -e stream.efm`
raw interleaved lines:   `cdkit encode -i test2.raw -o lines.bin`
decode and report:       `cdkit analyze stream.efm -s -e -o sectors.bin`
capture from analyzer:   `cdkit parsecsv capture.csv stream.bits`";

    let verbose_arg = Arg::new("verbose").short('v').long("verbose")
        .help("enable internal debug logs")
        .action(ArgAction::SetTrue);

    let mut main_cmd = Command::new("cdkit")
        .about("Encodes and decodes the physical CIRC/EFM bitstream of a compact disc.")
        .after_long_help(long_help)
        .version(crate_version!())
        .subcommand_required(true);

    main_cmd = main_cmd.subcommand(
        Command::new("encode")
            .arg(Arg::new("input").short('i').long("input").help("raw input, 2352 bytes per sector")
                .value_name("PATH").value_hint(ValueHint::FilePath).required(true))
            .arg(Arg::new("digital").short('d').long("digital").help("mark and scramble as data")
                .action(ArgAction::SetTrue))
            .arg(Arg::new("pregap").short('p').long("pregap").help("emit 153 leading pregap sectors")
                .action(ArgAction::SetTrue))
            .arg(Arg::new("efm").short('e').long("efm").help("write the EFM bitstream here")
                .value_name("PATH").value_hint(ValueHint::FilePath))
            .arg(Arg::new("output").short('o').long("output").help("write raw 32-byte lines here")
                .value_name("PATH").value_hint(ValueHint::FilePath))
            .arg(Arg::new("text").short('t').long("text").help("with --efm, write '0'/'1' text instead of packed bits")
                .action(ArgAction::SetTrue))
            .arg(verbose_arg.clone())
            .group(ArgGroup::new("sink").args(["efm","output"]).required(true))
            .about("encode raw sectors to the channel bitstream")
    );
    main_cmd = main_cmd.subcommand(
        Command::new("analyze")
            .arg(Arg::new("input").help("bitstream capture, packed or '0'/'1' text")
                .value_name("PATH").value_hint(ValueHint::FilePath).required(true))
            .arg(Arg::new("frames").short('f').long("frames").help("report frame statistics")
                .action(ArgAction::SetTrue))
            .arg(Arg::new("sectors").short('s').long("sectors").help("report per-sector subchannel status")
                .action(ArgAction::SetTrue))
            .arg(Arg::new("errors").short('e').long("errors").help("report codeword errors")
                .action(ArgAction::SetTrue))
            .arg(Arg::new("dataq").short('d').long("dataq").help("report decoded data-Q fields")
                .action(ArgAction::SetTrue))
            .arg(Arg::new("output").short('o').long("output").help("write decoded sectors here")
                .value_name("PATH").value_hint(ValueHint::FilePath))
            .arg(Arg::new("cooked").short('c').long("cooked").help("write 2352-byte sectors without subchannel")
                .action(ArgAction::SetTrue))
            .arg(verbose_arg.clone())
            .about("decode a captured bitstream and report anomalies")
    );
    main_cmd = main_cmd.subcommand(
        Command::new("parsecsv")
            .arg(Arg::new("input").help("logic analyzer CSV capture")
                .value_name("PATH").value_hint(ValueHint::FilePath).required(true))
            .arg(Arg::new("output").help("packed bit file to write")
                .value_name("PATH").value_hint(ValueHint::FilePath).required(true))
            .arg(verbose_arg.clone())
            .about("convert a logic analyzer CSV capture to a packed bit file")
    );
    main_cmd = main_cmd.subcommand(
        Command::new("mkraw")
            .arg(Arg::new("pattern").short('p').long("pattern").help("test pattern")
                .value_name("PATTERN").required(true)
                .value_parser(["cols","rows","secs","bytes"]))
            .arg(Arg::new("count").short('n').long("count").help("number of sectors")
                .value_name("COUNT").required(true)
                .value_parser(value_parser!(u32).range(1..)))
            .arg(Arg::new("output").short('o').long("output").help("raw sector file to write")
                .value_name("PATH").value_hint(ValueHint::FilePath).required(true))
            .arg(verbose_arg)
            .about("write a test-pattern sector file")
    );
    main_cmd
}
