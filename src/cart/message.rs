//! Checkout message
//!
//! The order is handed to `WhatsApp` as a pre-filled message in a `wa.me` deep link.

use std::fmt::Write;

use mockall::automock;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::{
    cart::line::CartLine,
    prices::Price,
    pricing::{Tier, select_tier},
};

/// Characters `encodeURIComponent` leaves untouched.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const GREETING: &str = "Hola Belle Parfumerie! Quiero realizar el siguiente pedido:";
const SIGN_OFF: &str = "Gracias!";

/// Opens a URL in an external application. Fire-and-forget: the outcome is not observable.
#[automock]
pub trait MessageLauncher {
    /// Open `url`.
    fn open(&self, url: &str);
}

/// Compose the order message for a set of lines.
///
/// Full and decant lines are listed in separate sections; a section with no lines is
/// omitted. The tier is selected from full quantities only.
pub fn compose(lines: &[CartLine]) -> String {
    let full_qty: u32 = lines
        .iter()
        .filter(|line| line.is_full())
        .map(|line| line.qty)
        .fold(0, u32::saturating_add);
    let tier = select_tier(full_qty);

    let mut blocks = vec![GREETING.to_string()];
    let mut grand_total = Price::ZERO;

    let full = lines.iter().filter(|line| line.is_full());
    if full_qty > 0 {
        let title = format!("*Perfumes ({} — {full_qty} unid.):*", tier.label());
        let (block, subtotal) = section(&title, full, tier, "");

        blocks.push(block);
        grand_total = grand_total + subtotal;
    }

    let mut decants = lines.iter().filter(|line| line.is_decant()).peekable();
    if decants.peek().is_some() {
        let (block, subtotal) = section("*Decants:*", decants, tier, " (decant)");

        blocks.push(block);
        grand_total = grand_total + subtotal;
    }

    blocks.push(format!("*Total: ${grand_total}*"));
    blocks.push(SIGN_OFF.to_string());

    blocks.join("\n\n")
}

fn section<'a>(
    title: &str,
    lines: impl Iterator<Item = &'a CartLine>,
    tier: Tier,
    suffix: &str,
) -> (String, Price) {
    let mut block = title.to_string();
    let mut subtotal = Price::ZERO;

    for line in lines {
        let unit = line.unit_price(tier);
        let total = line.line_total(tier);
        subtotal = subtotal + total;

        // Writing to a String cannot fail.
        _ = write!(
            block,
            "\n• {} - {}{suffix} x{} — ${total} (${unit} c/u)",
            line.marca, line.name, line.qty
        );
    }

    (block, subtotal)
}

/// Build the `wa.me` deep link for a phone number and message.
pub fn whatsapp_url(number: &str, message: &str) -> String {
    format!(
        "https://wa.me/{number}?text={}",
        utf8_percent_encode(message, URI_COMPONENT)
    )
}

#[cfg(test)]
mod tests {
    use crate::{
        cart::line::ItemType,
        prices::PriceTable,
    };

    use super::*;

    fn line(id: &str, item_type: ItemType, prices: PriceTable, qty: u32) -> CartLine {
        CartLine {
            id: id.to_string(),
            item_type,
            name: format!("Perfume {id}"),
            marca: "Maison".to_string(),
            image: String::new(),
            prices,
            qty,
        }
    }

    fn tiered(unit: u64, w3: u64, w10: u64) -> PriceTable {
        PriceTable {
            unitario: Some(Price::new(unit)),
            mayorista_3: Some(Price::new(w3)),
            mayorista_10: Some(Price::new(w10)),
        }
    }

    #[test]
    fn full_and_decant_sections() {
        let lines = [
            line("a", ItemType::Full, tiered(45_000, 42_000, 40_000), 3),
            line("b", ItemType::Decant, PriceTable::fixed(Price::new(6_000)), 2),
        ];

        let expected = "Hola Belle Parfumerie! Quiero realizar el siguiente pedido:\n\n\
            *Perfumes (Mayorista 3+ — 3 unid.):*\n\
            • Maison - Perfume a x3 — $126.000 ($42.000 c/u)\n\n\
            *Decants:*\n\
            • Maison - Perfume b (decant) x2 — $12.000 ($6.000 c/u)\n\n\
            *Total: $138.000*\n\n\
            Gracias!";

        assert_eq!(compose(&lines), expected);
    }

    #[test]
    fn empty_sections_are_omitted() {
        let lines = [line("a", ItemType::Full, tiered(100, 90, 80), 1)];

        let message = compose(&lines);

        assert!(message.contains("*Perfumes (Unitario — 1 unid.):*"));
        assert!(!message.contains("*Decants:*"));
        assert!(message.contains("*Total: $100*"));
    }

    #[test]
    fn decants_do_not_count_towards_tier() {
        let lines = [
            line("a", ItemType::Full, tiered(100, 90, 80), 2),
            line("b", ItemType::Decant, PriceTable::fixed(Price::new(10)), 20),
        ];

        let message = compose(&lines);

        assert!(message.contains("*Perfumes (Unitario — 2 unid.):*"));
        assert!(message.contains("*Total: $400*"));
    }

    #[test]
    fn url_encodes_like_encode_uri_component() {
        let url = whatsapp_url("5491112345678", "Hola! *Total: $1.000* — (ok)\n");

        assert_eq!(
            url,
            "https://wa.me/5491112345678?text=Hola!%20*Total%3A%20%241.000*%20%E2%80%94%20(ok)%0A"
        );
    }
}
