use std::io::IsTerminal;

use anstyle::{AnsiColor, Style};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputStyle {
    Plain,
    Rich,
}

pub fn current_output_style() -> OutputStyle {
    if std::env::var_os("NO_COLOR").is_some() {
        return OutputStyle::Plain;
    }
    if std::io::stdout().is_terminal() {
        OutputStyle::Rich
    } else {
        OutputStyle::Plain
    }
}

fn status_style() -> Style {
    Style::new().bold().fg_color(Some(AnsiColor::Green.into()))
}

fn warning_style() -> Style {
    Style::new().bold().fg_color(Some(AnsiColor::Yellow.into()))
}

pub fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => format!("{status:>10} {message}"),
        OutputStyle::Rich => {
            let accent = status_style();
            format!(
                "{}{:>10}{} {}",
                accent.render(),
                status,
                accent.render_reset(),
                message
            )
        }
    }
}

pub fn render_warning_line(style: OutputStyle, message: &str) -> String {
    match style {
        OutputStyle::Plain => format!("{:>10} {message}", "warning"),
        OutputStyle::Rich => {
            let accent = warning_style();
            format!(
                "{}{:>10}{} {}",
                accent.render(),
                "warning",
                accent.render_reset(),
                message
            )
        }
    }
}

pub fn print_status(status: &str, message: &str) {
    println!("{}", render_status_line(current_output_style(), status, message));
}

pub fn print_warning(message: &str) {
    eprintln!("{}", render_warning_line(current_output_style(), message));
}
