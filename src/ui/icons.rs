//! Shared UI icons and emojis.
//!
//! Each icon falls back to a plain ASCII marker on terminals without emoji support.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");
pub static FINISH: Emoji<'_, '_> = Emoji("🏁 ", "[DONE]");

// Gate indicators
pub static GATE_OPEN: Emoji<'_, '_> = Emoji("🔓 ", "[OPEN]");
pub static GATE_BLOCKED: Emoji<'_, '_> = Emoji("🔒 ", "[BLOCKED]");
pub static GATE_PENDING: Emoji<'_, '_> = Emoji("⏳ ", "[REVIEW]");

// Phase indicators
pub static PHASE_PLANNED: Emoji<'_, '_> = Emoji("⬜ ", "[ ]");
pub static PHASE_ACTIVE: Emoji<'_, '_> = Emoji("🔵 ", "[~]");

// Misc
pub static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
pub static ARROW: Emoji<'_, '_> = Emoji("➡️  ", "->");
