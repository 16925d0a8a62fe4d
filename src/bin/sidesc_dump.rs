use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use clap::Parser;
use log::LevelFilter;

use sidesc::utils::{parse_hex, to_hex};
use sidesc::xml::{self, Element};
use sidesc::{Context, DescriptorList};

/// Converts PSI/SI descriptor loops between their binary form (hex dump)
/// and their XML editing form. The direction is inferred from the input: a
/// document starting with `<` is compiled to a hex dump, anything else is
/// parsed as hex and decompiled to XML.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Input file; `-` reads standard input.
    input: String,

    /// Write output to this file instead of stdout.
    #[arg(short = 'f', long = "output")]
    output: Option<PathBuf>,

    /// Id of the table owning the loop (decimal or 0xNN); affects how
    /// table-specific tags are resolved.
    #[arg(short = 't', long = "table-id", value_parser = parse_table_id)]
    table_id: Option<u8>,

    /// -v for info, -vv for debug.
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_table_id(raw: &str) -> Result<u8, String> {
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.map_err(|_| format!("invalid table id '{raw}'"))
}

fn load_list(cli: &Cli, ctx: &Context<'_>, text: &str) -> Result<DescriptorList> {
    let mut list = match cli.table_id {
        Some(table_id) => DescriptorList::for_table(table_id),
        None => DescriptorList::new(),
    };
    if text.trim_start().starts_with('<') {
        let root = xml::parse_document(text)?;
        if root.name() != "descriptors" {
            bail!("expected a <descriptors> root element, found <{}>", root.name());
        }
        if !list.from_xml(ctx, root.children()) {
            bail!("some descriptor elements did not load");
        }
    } else {
        let bytes = parse_hex(text).context("input is neither XML nor a hex dump")?;
        if !list.add_bytes(&bytes) {
            bail!("trailing bytes do not form a complete descriptor");
        }
    }
    Ok(list)
}

fn render(ctx: &Context<'_>, list: &DescriptorList, to_xml: bool) -> Result<String> {
    if to_xml {
        let mut root = Element::new("descriptors");
        for element in list.to_xml(ctx) {
            root.add_child(element);
        }
        Ok(xml::write_document(&root)?)
    } else {
        let mut buf = sidesc::PsiBuffer::for_write(list.binary_size());
        list.serialize(&mut buf);
        Ok(to_hex(buf.written()))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )
    .context("failed to initialize logging")?;

    let text = if cli.input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        buffer
    } else {
        fs::read_to_string(&cli.input)
            .with_context(|| format!("failed to read {}", cli.input))?
    };

    let ctx = Context::default();
    let to_xml = !text.trim_start().starts_with('<');
    let list = load_list(&cli, &ctx, &text)?;
    let rendered = render(&ctx, &list, to_xml)?;

    match &cli.output {
        Some(path) => {
            fs::write(path, rendered.as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(rendered.as_bytes())?;
            handle.write_all(b"\n")?;
        }
    }
    Ok(())
}
