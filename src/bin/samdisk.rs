use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use std::fs;
use std::io::{self, Write};
use std::process;

use samdisk::basic::Program;
use samdisk::disk::directory::Variant;
use samdisk::disk::{self, Dos, MasterDos};

// Possible exit codes
static EXIT_FAILURE: i32 = 1;

/// If a dash is specified for a filename, this indicates that the user wants
/// to write to standard output.
static STDOUT_PSEUDOFILENAME: &str = "-";

fn build_app() -> App<'static, 'static> {
    App::new("SAM Coupé Disk Image Utility")
        .version("0.1.0")
        .about("Read SAMDOS/MasterDOS disk images and list SAM BASIC programs.")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(Arg::with_name("diskimage").required(true))
        .arg(
            Arg::with_name("masterdos")
                .short("m")
                .long("masterdos")
                .global(true)
                .help("Read the directory as MasterDOS"),
        )
        .subcommand(
            SubCommand::with_name("dir")
                .about("Show a directory listing")
                .arg(
                    Arg::with_name("directory")
                        .short("d")
                        .long("directory")
                        .takes_value(true)
                        .validator(slot_validator)
                        .help("Slot of the MasterDOS subdirectory to list"),
                )
                .arg(
                    Arg::with_name("verbose")
                        .short("v")
                        .long("verbose")
                        .help("Show more detail"),
                ),
        )
        .subcommand(
            SubCommand::with_name("read")
                .about("Read a file from a disk image.")
                .arg(Arg::with_name("source_filename").required(true))
                .arg(Arg::with_name("destination_filename").required(false)),
        )
        .subcommand(
            SubCommand::with_name("list")
                .about("List a SAM BASIC program and its variables.")
                .arg(Arg::with_name("filename").required(true)),
        )
        .subcommand(
            SubCommand::with_name("dump")
                .about("Provide a hex dump of a disk image or file.")
                .arg(Arg::with_name("filename").required(false)),
        )
}

/// The global flag may appear before or after the subcommand name.
fn variant_of(matches: &ArgMatches) -> Variant {
    let in_subcommand = matches
        .subcommand()
        .1
        .map_or(false, |m| m.is_present("masterdos"));
    if matches.is_present("masterdos") || in_subcommand {
        Variant::MasterDos
    } else {
        Variant::SamDos
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Parse command-line arguments
    let app = build_app();
    let mut app_clone = app.clone();
    let matches = app.get_matches();

    let diskimage = matches.value_of("diskimage").unwrap();
    let variant = variant_of(&matches);
    let result = match matches.subcommand() {
        ("dir", Some(m)) => cmd_dir(
            diskimage,
            variant,
            m.value_of("directory").map(|s| s.parse::<u16>().unwrap()),
            m.is_present("verbose"),
        ),
        ("read", Some(m)) => cmd_read(
            diskimage,
            variant,
            m.value_of("source_filename").unwrap(),
            m.value_of("destination_filename"),
        ),
        ("list", Some(m)) => cmd_list(diskimage, variant, m.value_of("filename").unwrap()),
        ("dump", Some(m)) => cmd_dump(diskimage, variant, m.value_of("filename")),
        _ => {
            app_clone.print_help().unwrap();
            println!();
            process::exit(EXIT_FAILURE);
        }
    };
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(EXIT_FAILURE);
    }
}

/// Require a directory argument to be a slot number.
fn slot_validator(v: String) -> Result<(), String> {
    match v.parse::<u16>() {
        Ok(_) => Ok(()),
        Err(_) => Err("Expected a directory slot number.".to_string()),
    }
}

/// Open a file for writing
fn open_fs_writer(filename: &str) -> io::Result<Box<dyn Write>> {
    if filename == STDOUT_PSEUDOFILENAME {
        Ok(Box::new(io::stdout()))
    } else {
        Ok(Box::new(fs::File::create(filename)?))
    }
}

fn print_listing(dos: &dyn Dos, verbose: bool) {
    println!("{}", dos);
    for entry in dos {
        if verbose {
            println!("{:#}", entry);
        } else {
            println!("{}", entry);
        }
    }
}

fn cmd_dir(
    diskimage: &str,
    variant: Variant,
    directory: Option<u16>,
    verbose: bool,
) -> io::Result<()> {
    match variant {
        Variant::MasterDos => {
            let mut dos = MasterDos::new(disk::open(diskimage)?)?;
            if let Some(slot) = directory {
                dos.cd(slot)?;
            }
            println!("Directory {}", dos.pwd());
            print_listing(&dos, verbose);
        }
        Variant::SamDos => {
            if directory.is_some() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "--directory requires --masterdos",
                ));
            }
            print_listing(disk::open_dos(diskimage, variant)?.as_ref(), verbose)
        }
    }
    Ok(())
}

fn cmd_read(
    diskimage: &str,
    variant: Variant,
    source_filename: &str,
    destination_filename: Option<&str>,
) -> io::Result<()> {
    let dos = disk::open_dos(diskimage, variant)?;
    let file = dos.open_file_from_entry(dos.resolve(source_filename)?)?;
    let name = file.entry.filename.trimmed();
    let destination_filename = destination_filename.unwrap_or(&name);
    let mut writer = open_fs_writer(destination_filename)?;
    writer.write_all(&file.data)?;
    writer.flush()?;
    Ok(())
}

fn cmd_list(diskimage: &str, variant: Variant, filename: &str) -> io::Result<()> {
    let dos = disk::open_dos(diskimage, variant)?;
    let file = dos.open_file_from_entry(dos.resolve(filename)?)?;
    print!("{}", Program::decode(&file));
    io::stdout().flush()?;
    Ok(())
}

fn cmd_dump(diskimage: &str, variant: Variant, filename: Option<&str>) -> io::Result<()> {
    let dos = disk::open_dos(diskimage, variant)?;
    match filename {
        Some(filename) => {
            let file = dos.open_file_from_entry(dos.resolve(filename)?)?;
            file.dump(&mut io::stdout())?;
        }
        None => dos.dump(&mut io::stdout())?,
    }
    io::stdout().flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> clap::Result<ArgMatches<'static>> {
        build_app().get_matches_from_safe(args.to_vec())
    }

    #[test]
    fn test_masterdos_flag_position() {
        for args in [
            &["samdisk", "disk.mgt", "-m", "dir", "-d", "1"][..],
            &["samdisk", "disk.mgt", "dir", "-m", "-d", "1"][..],
        ]
        .iter()
        {
            let matches = parse(args).unwrap();
            assert_eq!(variant_of(&matches), Variant::MasterDos);
            let (name, dir) = matches.subcommand();
            assert_eq!(name, "dir");
            assert_eq!(dir.unwrap().value_of("directory"), Some("1"));
        }

        let matches = parse(&["samdisk", "disk.mgt", "list", "auto"]).unwrap();
        assert_eq!(variant_of(&matches), Variant::SamDos);
        assert!(parse(&["samdisk", "disk.mgt", "dir", "-d", "x"]).is_err());
    }

    #[test]
    fn test_directory_requires_masterdos() {
        let e = cmd_dir("no-such-image.mgt", Variant::SamDos, Some(1), false)
            .err()
            .unwrap();
        assert_eq!(e.kind(), io::ErrorKind::InvalidInput);
    }
}
