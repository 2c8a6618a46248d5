//! Template compilation
//!
//! A template is text with embedded markers:
//!
//! ```text
//! <table>
//! <% for name, count in rows %>
//!   <tr><td>${{ name }}</td><td #{{ style("td", {"background-color": gradient("low", "high", share(count, top))}) }}>#{{ count }}</td></tr>
//! <% endfor %>
//! </table>
//! ```
//!
//! `#{{ expr }}` writes the value as-is, `${{ expr }}` writes it HTML-escaped,
//! and `<% ... %>` holds statements (`for`, `if`/`elif`/`else`, `end`,
//! assignments). Compiling checks marker pairing and fragment grammar only.

pub mod ast;
mod compiler;
mod config;
mod grammar;
pub mod lexer;

pub use compiler::{compile, CompiledTemplate, Compiler, Node};
pub use config::CompileConfig;
pub use grammar::{parse_block, parse_expression};
