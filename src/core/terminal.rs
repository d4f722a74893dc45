use console::{style, Emoji};

pub static SUCCESS_ICON: Emoji<'_, '_> = Emoji("✅ ", "");
pub static INFO_ICON: Emoji<'_, '_> = Emoji("ℹ️  ", "");
pub static WARN_ICON: Emoji<'_, '_> = Emoji("⚠️  ", "");
pub static ERROR_ICON: Emoji<'_, '_> = Emoji("❌ ", "");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "");
pub static GLOBE: Emoji<'_, '_> = Emoji("🌐 ", "");
pub static GEAR: Emoji<'_, '_> = Emoji("⚙️  ", "");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "");

pub fn print_success(msg: &str) {
    println!("{} {}", SUCCESS_ICON, style(msg).green());
}

pub fn print_info(msg: &str) {
    println!("{} {}", INFO_ICON, style(msg).blue());
}

pub fn print_warn(msg: &str) {
    println!("{} {}", WARN_ICON, style(msg).yellow());
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", ERROR_ICON, style(msg).red().bold());
}

pub fn print_status(label: &str, msg: &str) {
    println!("  {} {}: {}", GEAR, style(label).bold().cyan(), msg);
}

pub fn print_step(step: &str) {
    println!("{} {}", SPARKLE, style(step).bold());
}

pub fn print_link(label: &str, url: &str) {
    println!(
        "  {} {}: {}",
        GLOBE,
        style(label).bold(),
        style(url).underlined().cyan()
    );
}

pub fn print_banner() {
    let lines: &[&str] = &[
        " _       _                             ",
        "(_)_ __ | | __ _ __  _ __ ___  ___ ___ ",
        "| | '_ \\| |/ /| '_ \\| '__/ _ \\/ __/ __|",
        "| | | | |   < | |_) | | |  __/\\__ \\__ \\",
        "|_|_| |_|_|\\_\\| .__/|_|  \\___||___/___/",
        "              |_|                      ",
    ];

    // Gradient: #38bdf8 → #818cf8 → #f472b6 (diagonal top-left → bottom-right)
    let stops: [(u8, u8, u8); 3] = [(56, 189, 248), (129, 140, 248), (244, 114, 182)];
    let max_w = 39u32;
    let max_d = max_w + 5 * 10;

    println!();
    for (y, line) in lines.iter().enumerate() {
        for (x, ch) in line.chars().enumerate() {
            if ch == ' ' {
                print!(" ");
                continue;
            }
            let d = ((x as u32 + y as u32 * 10) * 1000 / max_d).min(1000);
            let (r, g, b) = if d <= 500 {
                let t = d * 2;
                lerp_color(stops[0], stops[1], t)
            } else {
                let t = (d - 500) * 2;
                lerp_color(stops[1], stops[2], t)
            };
            print!("\x1b[38;2;{};{};{}m{}", r, g, b, ch);
        }
        println!();
    }
    print!("\x1b[0m");

    println!("\x1b[38;2;244;114;182mKeyword in. Published post out.\x1b[0m\n");
}

fn lerp_color(a: (u8, u8, u8), b: (u8, u8, u8), t: u32) -> (u8, u8, u8) {
    let r = (a.0 as u32 * (1000 - t) + b.0 as u32 * t) / 1000;
    let g = (a.1 as u32 * (1000 - t) + b.1 as u32 * t) / 1000;
    let b_val = (a.2 as u32 * (1000 - t) + b.2 as u32 * t) / 1000;
    (r as u8, g as u8, b_val as u8)
}

enum GuideRow {
    Command { name: String, desc: String },
    Status { label: String, value: String },
    Text(String),
    Hint { example: String, desc: String },
    Blank,
}

/// Small builder for aligned help/status blocks printed by the CLI.
pub struct GuideSection {
    title: String,
    rows: Vec<GuideRow>,
}

impl GuideSection {
    pub fn new(title: &str) -> Self {
        GuideSection {
            title: title.to_string(),
            rows: Vec::new(),
        }
    }

    pub fn command(mut self, name: &str, desc: &str) -> Self {
        self.rows.push(GuideRow::Command {
            name: name.to_string(),
            desc: desc.to_string(),
        });
        self
    }

    pub fn status(mut self, label: &str, value: &str) -> Self {
        self.rows.push(GuideRow::Status {
            label: label.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn text(mut self, line: &str) -> Self {
        self.rows.push(GuideRow::Text(line.to_string()));
        self
    }

    pub fn hint(mut self, example: &str, desc: &str) -> Self {
        self.rows.push(GuideRow::Hint {
            example: example.to_string(),
            desc: desc.to_string(),
        });
        self
    }

    pub fn blank(mut self) -> Self {
        self.rows.push(GuideRow::Blank);
        self
    }

    pub fn print(self) {
        println!("\n {}", style(&self.title).bold().underlined());

        // Pad raw strings before styling so ANSI codes don't skew the columns.
        let pad = self
            .rows
            .iter()
            .map(|row| match row {
                GuideRow::Command { name, .. } => name.len(),
                GuideRow::Hint { example, desc } if !desc.is_empty() => example.len(),
                _ => 0,
            })
            .max()
            .unwrap_or(0);

        for row in &self.rows {
            match row {
                GuideRow::Command { name, desc } => {
                    println!(
                        "   {}  {}",
                        style(format!("{:<width$}", name, width = pad)).green().bold(),
                        desc
                    );
                }
                GuideRow::Status { label, value } => {
                    println!("   {} {}: {}", GEAR, style(label).bold().cyan(), value);
                }
                GuideRow::Text(line) => println!("   {}", line),
                GuideRow::Hint { example, desc } => {
                    if desc.is_empty() {
                        println!("   {}", style(example).cyan());
                    } else {
                        println!(
                            "   {}  {}",
                            style(format!("{:<width$}", example, width = pad)).cyan(),
                            style(desc).dim()
                        );
                    }
                }
                GuideRow::Blank => println!(),
            }
        }
    }
}
