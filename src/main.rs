use typeflow::jvm;
use typeflow::jvm::class_file::{
    decode_attribute_body, ConstantsPool, RuntimeInvisibleTypeAnnotations,
    RuntimeVisibleTypeAnnotations,
};
use typeflow::typeanno::Disassembler;

use clap::{crate_version, Arg, ArgAction, Command};
use std::fs;
use std::io;

fn main() -> Result<(), jvm::Error> {
    env_logger::init();

    let matches = Command::new("Type annotation attribute disassembler")
        .version(crate_version!())
        .about("Print the entries of a RuntimeVisibleTypeAnnotations or RuntimeInvisibleTypeAnnotations attribute body")
        .arg(
            Arg::new("hex")
                .long("hex")
                .action(ArgAction::SetTrue)
                .help("Input is whitespace separated hex bytes instead of raw bytes"),
        )
        .arg(
            Arg::new("invisible")
                .long("invisible")
                .action(ArgAction::SetTrue)
                .help("Attribute is RuntimeInvisibleTypeAnnotations"),
        )
        .arg(
            Arg::new("constants")
                .long("constants")
                .value_name("FILE")
                .help("Constant pool (count followed by entries, as in a class file) that the attribute refers to"),
        )
        .arg(
            Arg::new("INPUT")
                .help("File containing the attribute body (without name and length)")
                .required(true)
                .index(1),
        )
        .get_matches();

    let input = matches
        .get_one::<String>("INPUT")
        .expect("INPUT is a required argument");
    log::info!("Reading '{}'", input);
    let hex = matches.get_flag("hex");
    let bytes = read_input(input, hex)?;

    let constants: Option<ConstantsPool> = match matches.get_one::<String>("constants") {
        Some(path) => {
            log::info!("Reading constants from '{}'", path);
            let pool: ConstantsPool = decode_attribute_body(&read_input(path, hex)?)?;
            log::debug!("Constant pool has {} slots", pool.count());
            Some(pool)
        }
        None => None,
    };

    // Without a constant pool, names print as constant indices
    let disassembler = match &constants {
        Some(pool) => Disassembler::new(pool),
        None => Disassembler::without_constants(),
    };
    let output = if matches.get_flag("invisible") {
        let attribute: RuntimeInvisibleTypeAnnotations = decode_attribute_body(&bytes)?;
        log::info!("Decoded {} entries", attribute.0.len());
        disassembler.invisible(&attribute)
    } else {
        let attribute: RuntimeVisibleTypeAnnotations = decode_attribute_body(&bytes)?;
        log::info!("Decoded {} entries", attribute.0.len());
        disassembler.visible(&attribute)
    };
    print!("{}", output);

    Ok(())
}

fn read_input(path: &str, hex: bool) -> io::Result<Vec<u8>> {
    let bytes = fs::read(path)?;
    if hex {
        parse_hex(&String::from_utf8_lossy(&bytes))
    } else {
        Ok(bytes)
    }
}

/// Parse bytes written like `00 01 13 0x00`
fn parse_hex(text: &str) -> io::Result<Vec<u8>> {
    text.split_whitespace()
        .map(|token| {
            let digits = token.trim_start_matches("0x");
            u8::from_str_radix(digits, 16).map_err(|err| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("invalid hex byte '{}': {}", token, err),
                )
            })
        })
        .collect()
}
