//! Renders a hackathon listing into a Discord embed.  Pure formatting, no
//! I/O; the field order is fixed and covered by tests.

use crate::devpost::Listing;
use serenity::all::CreateEmbed;

const EMBED_COLOR: u32 = 0x00ff00;
const FOOTER: &str = "Devpost New Alert";

/// Embed fields in announcement order.
pub fn announcement_fields(listing: &Listing) -> Vec<(&'static str, String)> {
    let prize = format!(
        "{} ({} cash, {} other)",
        listing.prize_amount, listing.prize_cash, listing.prize_other
    );

    let themes = if listing.themes.is_empty() {
        "N/A".to_string()
    } else {
        listing.themes.join(", ")
    };

    vec![
        ("Status", listing.status.clone()),
        ("Location", listing.location.clone()),
        ("Host", listing.host.clone()),
        ("Period", listing.submission_period.clone()),
        ("Prize", prize),
        ("Themes", themes),
    ]
}

pub fn build_embed(listing: &Listing) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(listing.title.clone())
        .url(listing.url.clone())
        .color(EMBED_COLOR)
        .footer(serenity::all::CreateEmbedFooter::new(FOOTER));

    if let Some(thumbnail) = &listing.thumbnail_url {
        embed = embed.thumbnail(thumbnail.clone());
    }

    for (name, value) in announcement_fields(listing) {
        embed = embed.field(name, value, true);
    }

    embed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Listing {
        Listing {
            url: "https://example.devpost.com".into(),
            title: "Example Hack".into(),
            thumbnail_url: Some("https://cdn.example.com/thumb.png".into()),
            status: "6 days left".into(),
            location: "Berlin, Germany".into(),
            host: "Example Org".into(),
            submission_period: "Jan 01 - Feb 01, 2026".into(),
            prize_amount: "$20,000".into(),
            prize_cash: 3,
            prize_other: 1,
            themes: vec!["AI".into(), "Open Source".into()],
        }
    }

    #[test]
    fn fields_are_in_fixed_order() {
        let fields = announcement_fields(&listing());
        let names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();

        assert_eq!(
            names,
            vec!["Status", "Location", "Host", "Period", "Prize", "Themes"]
        );
    }

    #[test]
    fn prize_field_is_a_composite() {
        let fields = announcement_fields(&listing());
        let prize = &fields.iter().find(|(name, _)| *name == "Prize").unwrap().1;
        assert_eq!(prize, "$20,000 (3 cash, 1 other)");
    }

    #[test]
    fn themes_join_with_commas() {
        let fields = announcement_fields(&listing());
        let themes = &fields.iter().find(|(name, _)| *name == "Themes").unwrap().1;
        assert_eq!(themes, "AI, Open Source");
    }

    #[test]
    fn empty_themes_render_as_na() {
        let mut listing = listing();
        listing.themes.clear();

        let fields = announcement_fields(&listing);
        let themes = &fields.iter().find(|(name, _)| *name == "Themes").unwrap().1;
        assert_eq!(themes, "N/A");
    }

    #[test]
    fn formatting_is_deterministic() {
        assert_eq!(announcement_fields(&listing()), announcement_fields(&listing()));
    }
}
