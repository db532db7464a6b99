//! `hottake styles` - List generation styles.

use hottake_core::style::Style;

pub fn run() {
    println!("🎭 Styles");
    println!("=========");
    println!();
    for name in Style::names() {
        let marker = if name == Style::default().as_str() {
            " (default)"
        } else {
            ""
        };
        println!("  • {name}{marker}");
    }
}
