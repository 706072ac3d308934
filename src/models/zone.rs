use rust_decimal::Decimal;

/// A bookable activity area at the venue. The set is fixed for the life of
/// the process; rates are venue-local currency per hour.
#[derive(Debug, Clone)]
pub struct Zone {
    pub id: &'static str,
    pub name: &'static str,
    rate_cents: i64,
}

impl Zone {
    pub fn rate_per_hour(&self) -> Decimal {
        Decimal::new(self.rate_cents, 2)
    }
}

pub const ZONES: &[Zone] = &[
    Zone {
        id: "splash-zone-a",
        name: "Splash Zone A",
        rate_cents: 15000,
    },
    Zone {
        id: "splash-zone-b",
        name: "Splash Zone B",
        rate_cents: 12500,
    },
    Zone {
        id: "foam-dome",
        name: "Foam Dome",
        rate_cents: 20000,
    },
];

/// Case-insensitive lookup by id or display name.
pub fn find(zone: &str) -> Option<&'static Zone> {
    let needle = zone.trim().to_lowercase();
    ZONES
        .iter()
        .find(|z| z.id == needle || z.name.to_lowercase() == needle)
}
