use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use layoutdb_core::node::{TypeId, TypeNode};
use layoutdb_core::symbols::ImageSymbols;
use layoutdb_core::types::Address;
use layoutdb_core::vtbl::{Itanium, Msvc, VtblCache, VtblSymbolNaming};
use layoutdb_core::TypeDbResult;
use layoutdb_utils::{info, init_logging_with_config, LogFormat, LogLevel, LoggingConfig, LoggingGuard};

/// Resolve C++ vtable symbols and addresses of named types.
#[derive(Parser, Debug)]
#[command(name = "layoutdb")]
#[command(version)]
#[command(about = "Resolve C++ vtable symbols and addresses of named types", long_about = None)]
struct Cli
{
    /// Log level (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format: pretty or json (overrides LAYOUTDB_LOG_FORMAT)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Print the vtable symbol each type would use
    Symbol
    {
        /// C++ ABI naming scheme
        #[arg(long, value_enum, default_value_t = Abi::Itanium)]
        abi: Abi,
        /// Type names (nested names as `ns::Type`)
        #[arg(required = true)]
        types: Vec<String>,
    },
    /// Look up the vtable address point of each type in a binary
    Vtable
    {
        /// Binary image to read symbols from
        #[arg(long)]
        binary: PathBuf,
        /// Runtime load address of the image (hex `0x...` or decimal)
        #[arg(long, value_parser = parse_address)]
        load_address: Option<Address>,
        /// C++ ABI naming scheme
        #[arg(long, value_enum, default_value_t = Abi::Itanium)]
        abi: Abi,
        /// Type names (nested names as `ns::Type`)
        #[arg(required = true)]
        types: Vec<String>,
    },
}

/// C++ ABI whose vtable naming to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Abi
{
    /// GCC and Clang on Linux, macOS and the BSDs
    Itanium,
    /// Microsoft Visual C++
    Msvc,
}

impl Abi
{
    fn naming(self) -> Arc<dyn VtblSymbolNaming>
    {
        match self {
            Abi::Itanium => Arc::new(Itanium),
            Abi::Msvc => Arc::new(Msvc),
        }
    }
}

fn parse_address(s: &str) -> Result<Address, String>
{
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => s.replace('_', "").parse::<u64>(),
    };
    parsed
        .map(Address::new)
        .map_err(|err| format!("invalid address {s}: {err}"))
}

fn init(cli: &Cli) -> Result<LoggingGuard, Box<dyn std::error::Error>>
{
    let mut config = LoggingConfig::from_env()?;
    if let Some(level) = cli.log_level {
        config.level = Some(level);
    }
    if let Some(format) = cli.log_format {
        config.format = format;
    }
    Ok(init_logging_with_config(&config)?)
}

fn main()
{
    let cli = Cli::parse();

    let _guard = match init(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_command(command: Commands) -> TypeDbResult<()>
{
    match command {
        Commands::Symbol { abi, types } => {
            let naming = abi.naming();
            for name in types {
                let symbol = naming.symbol_name_for(&TypeNode::new(name.as_str(), 0));
                println!("{name}\t{}", symbol.as_deref().unwrap_or("<none>"));
            }
            Ok(())
        }
        Commands::Vtable {
            binary,
            load_address,
            abi,
            types,
        } => {
            let image = ImageSymbols::load(&binary, load_address)?;
            info!(
                "Loaded {} symbols from {} ({}-byte pointers)",
                image.len(),
                binary.display(),
                image.address_size()
            );

            let address_size = image.address_size();
            let library = image.name().to_string();
            let cache = VtblCache::new(Arc::new(image), abi.naming(), vec![library]);

            for (index, name) in (0u32..).zip(types) {
                let node = TypeNode::new(name.as_str(), 0);
                match cache.resolve(TypeId::from(index), &node, address_size) {
                    Some(address) => println!("{name}\t{address}"),
                    None => println!("{name}\t<none>"),
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_parse_address()
    {
        assert_eq!(parse_address("0x7f00_0000").unwrap(), Address::new(0x7f00_0000));
        assert_eq!(parse_address("4096").unwrap(), Address::new(4096));
        assert!(parse_address("0xnope").is_err());
    }

    #[test]
    fn test_cli_parses_vtable_command()
    {
        let cli = Cli::try_parse_from([
            "layoutdb",
            "vtable",
            "--binary",
            "libjvm.so",
            "--load-address",
            "0x7f0000000000",
            "--abi",
            "msvc",
            "Thread",
            "gc::Space",
        ])
        .unwrap();
        match cli.command {
            Commands::Vtable {
                load_address,
                abi,
                types,
                ..
            } => {
                assert_eq!(load_address, Some(Address::new(0x7f00_0000_0000)));
                assert_eq!(abi, Abi::Msvc);
                assert_eq!(types, ["Thread", "gc::Space"]);
            }
            Commands::Symbol { .. } => panic!("Expected vtable command"),
        }
    }

    #[test]
    fn test_cli_rejects_missing_types()
    {
        assert!(Cli::try_parse_from(["layoutdb", "symbol"]).is_err());
        let cli = Cli::try_parse_from(["layoutdb", "--log-level", "debug", "symbol", "Klass"]).unwrap();
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
    }
}
