//! Templar CLI
//!
//! Usage:
//!   templar [OPTIONS] [FILE]
//!
//! Options:
//!   -t, --theme <FILE>  Theme file (built-in theme if not provided)
//!   -d, --data <FILE>   Template variables (TOML format)
//!       --no-trim       Keep the lines around standalone code blocks
//!   -g, --grammar       Show template syntax reference
//!   -h, --help          Print help

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;

use templar::render::render;
use templar::{default_theme, CompileConfig, Compiler, RenderContext, Theme, Value};

#[derive(Parser)]
#[command(name = "templar")]
#[command(about = "Render a theme-aware HTML template")]
struct Cli {
    /// Template file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Theme file with [@colors], [@screen] and class sections
    #[arg(short, long)]
    theme: Option<PathBuf>,

    /// Template variables (TOML format)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Keep indentation and line breaks around standalone code blocks
    #[arg(long)]
    no_trim: bool,

    /// Show template syntax reference
    #[arg(short, long)]
    grammar: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if cli.grammar {
        print_grammar();
        return;
    }

    let theme = match &cli.theme {
        Some(path) => match Theme::load(&read_file(path)) {
            Ok(theme) => theme,
            Err(e) => {
                eprintln!("Error loading theme '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => default_theme(),
    };

    let values = match &cli.data {
        Some(path) => match toml::from_str::<Value>(&read_file(path)) {
            Ok(values) => values,
            Err(e) => {
                eprintln!("Error parsing data '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Value::Null,
    };

    let (source, filename) = match &cli.input {
        Some(path) => (read_file(path), path.display().to_string()),
        None => {
            let mut buffer = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buffer) {
                eprintln!("Error reading from stdin: {}", e);
                std::process::exit(1);
            }
            (buffer, "<stdin>".to_string())
        }
    };

    let compiler = Compiler::new(CompileConfig::new().with_trim_code_lines(!cli.no_trim));
    let template = match compiler.compile(&source) {
        Ok(template) => template,
        Err(e) => {
            eprint!("{}", e.format(&source, &filename));
            std::process::exit(1);
        }
    };

    let mut context = RenderContext::with_theme(Arc::new(theme));
    context.extend_from(values);
    match render(&template, &mut context) {
        Ok(output) => print!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn read_file(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn print_grammar() {
    println!(
        r#"TEMPLAR TEMPLATE SYNTAX
=======================

MARKERS
-------
#{{{{ expr }}}}      Write the value as-is
${{{{ expr }}}}      Write the value HTML-escaped
<% stmts %>      Code block, one statement per line or separated by ';'

A code block alone on its line takes its line break with it.

STATEMENTS
----------
for x in expr            Loop over a list, map keys or string characters
for k, v in expr         Loop over map entries or two-element lists
if expr / elif expr      Conditional branches (a trailing ':' is allowed)
else
end / endfor / endif     Close the innermost block
x = expr                 Assign (also += and -=)
pass                     Do nothing
# comment                Until the end of the line

EXPRESSIONS
-----------
Literals:    1  2.5  "text"  'text'  true  false  none  [1, 2]  {{key: 1}}
Access:      m.key  m["key"]  xs[0]  xs[-1]
Operators:   + - * / // %   == != < <= > >=   in  not in   and or not

HELPERS
-------
escape str int float len range keys values sorted min max abs
round(x, digits)   dec(x, digits)   pct(part, total, digits)
dist(km)   lat(deg)   lon(deg)   share(value, top)
date(value, "{{day}}. {{monthname}}")   date_range(start, end)

THEME HELPERS
-------------
css("class", ..., {{"property": value}})    Declarations as "prop: value;"
style("class", ...)                       Same, as a style="..." attribute
gradient("from", "to", ratio)             Color between two theme colors
css_header()                              Rules of the [@screen] section

EXAMPLE
-------
<% for name, count in finds %>
<tr><td>${{{{ name }}}}</td><td#{{{{ style("td", {{"background": gradient("lightmin", "lightmax", share(count, top))}}) }}}}>#{{{{ count }}}}</td></tr>
<% endfor %>"#
    );
}
