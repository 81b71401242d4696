use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result, anyhow, bail};
use log::debug;

use tinyc::backend::vm::VM;
use tinyc::backend::{PreparedBackend, backend_named, disasm};
use tinyc::config::Config;
use tinyc::{lexer, parser};

struct Options {
    backend: String,
    config: Config,
    dump: bool,
    tokens: bool,
    input_path: Option<String>,
}

fn parse_options() -> Result<Options> {
    let mut args = std::env::args().skip(1);
    let mut options = Options {
        backend: "vm".to_string(),
        config: Config::default(),
        dump: false,
        tokens: false,
        input_path: None,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--backend" | "-b" => {
                options.backend = args
                    .next()
                    .ok_or_else(|| anyhow!("Missing backend name after {arg}"))?;
            }
            "--memory" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("Missing byte count after {arg}"))?;
                let memory_size = value
                    .parse()
                    .with_context(|| format!("Invalid memory size '{value}'"))?;
                options.config = options.config.with_memory_size(memory_size);
            }
            "--max-depth" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("Missing depth after {arg}"))?;
                let max_depth = value
                    .parse()
                    .with_context(|| format!("Invalid nesting depth '{value}'"))?;
                options.config = options.config.with_max_depth(max_depth);
            }
            "--dump" => options.dump = true,
            "--tokens" => options.tokens = true,
            _ if arg.starts_with('-') => bail!("Unknown option '{arg}'"),
            _ => {
                if options.input_path.replace(arg).is_some() {
                    bail!("Only one input file is supported");
                }
            }
        }
    }

    Ok(options)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let options = parse_options()?;
    debug!("Using {:?}", options.config);

    let source = if let Some(path) = &options.input_path {
        fs::read_to_string(path).with_context(|| format!("Reading {path}"))?
    } else {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Reading stdin")?;
        buffer
    };

    if options.tokens {
        for token in lexer::tokenize(&source)? {
            println!("{}:{} {}", token.span.line, token.span.column, token.kind);
        }
        return Ok(());
    }

    let program = parser::parse_with_config(&source, &options.config)?;

    let backend = backend_named(&options.backend, options.config)
        .ok_or_else(|| anyhow!("Unknown backend '{}'", options.backend))?;
    debug!("Selected backend {}", backend.name());

    let globals = if options.dump {
        if backend.name() != "vm" {
            bail!("--dump is only available with the vm backend");
        }
        let prepared = VM::with_config(options.config).compile(&program)?;
        eprint!("{}", disasm::disassemble(prepared.code().as_bytes())?);
        prepared.run()?
    } else {
        backend.run(&program)?
    };
    print!("{globals}");
    Ok(())
}
