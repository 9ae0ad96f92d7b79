//! Terminal rendering of shops and scan progress.

use std::io::{IsTerminal, Write};

use owo_colors::OwoColorize;
use shopscan::shop::rarity_symbol;
use shopscan::{Rarity, ScanObserver, ShopRecord};

/// Longest description shown before it is cut
pub const DESCRIPTION_WIDTH: usize = 80;

/// Cut `text` to `max` characters, appending `...` when something was cut
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// First `max` characters of `text`, no marker
pub fn first_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

fn paint(text: &str, rarity: Option<Rarity>, color: bool) -> String {
    match rarity {
        Some(r) if color => {
            let (red, green, blue) = r.rgb();
            text.truecolor(red, green, blue).bold().to_string()
        }
        _ => text.to_string(),
    }
}

/// Render one shop: a header line then one line per item
pub fn format_shop(number: usize, shop: &ShopRecord, color: bool) -> String {
    let marker = if shop.done { "✓" } else { "○" };
    let header = format!(
        "{} Shop #{}  {}",
        marker,
        number,
        rarity_symbol(Some(shop.rarity))
    );
    let mut out = paint(&header, shop.rarity_tier(), color);

    for (index, (item, price)) in shop.offers().enumerate() {
        let symbol = item.rarity.map(|r| rarity_symbol(Some(r))).unwrap_or("");
        let name = paint(
            format!("{} {}", item.name, symbol).trim_end(),
            item.rarity_tier(),
            color,
        );
        let description = truncate(&item.description, DESCRIPTION_WIDTH);
        let description = if color {
            description.dimmed().to_string()
        } else {
            description
        };
        out.push_str(&format!(
            "\n  {}. {}  $ {}  {}",
            index + 1,
            name,
            price,
            description
        ));
    }
    out
}

/// Observer printing shops to stdout and everything else to stderr
pub struct TerminalObserver {
    color: bool,
    show_progress: bool,
    progress_pending: bool,
    shown: usize,
}

impl Default for TerminalObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalObserver {
    pub fn new() -> Self {
        Self {
            color: std::io::stdout().is_terminal(),
            show_progress: std::io::stderr().is_terminal(),
            progress_pending: false,
            shown: 0,
        }
    }

    pub fn shown(&self) -> usize {
        self.shown
    }

    fn end_progress_line(&mut self) {
        if self.progress_pending {
            eprintln!();
            self.progress_pending = false;
        }
    }
}

impl ScanObserver for TerminalObserver {
    fn shop_found(&mut self, shop: &ShopRecord) {
        self.end_progress_line();
        self.shown += 1;
        println!("{}\n", format_shop(self.shown, shop, self.color));
    }

    fn progress(&mut self, current: usize, total: usize) {
        if !self.show_progress || total == 0 {
            return;
        }
        eprint!("\rScanning regions {}/{}", current, total);
        let _ = std::io::stderr().flush();
        self.progress_pending = current < total;
        if !self.progress_pending {
            eprintln!();
        }
    }

    fn status(&mut self, message: &str) {
        self.end_progress_line();
        eprintln!("{}", message);
    }
}
