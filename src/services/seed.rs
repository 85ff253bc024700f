use chrono::{DateTime, Utc};

use crate::models::property::{Property, PropertyStatus, TransactionType};

#[allow(clippy::too_many_arguments)]
fn listing(
    id: i32,
    title: &str,
    description: &str,
    price: f64,
    transaction_type: TransactionType,
    (address, city, province): (&str, &str, &str),
    (bedrooms, bathrooms, size): (i32, i32, f64),
    features: &[&str],
    image: &str,
    featured: bool,
    now: DateTime<Utc>,
) -> Property {
    Property {
        id,
        title: title.to_string(),
        description: description.to_string(),
        price,
        transaction_type,
        address: address.to_string(),
        city: city.to_string(),
        province: province.to_string(),
        bedrooms,
        bathrooms,
        size,
        floor: None,
        total_floors: None,
        year_built: None,
        energy_class: None,
        features: features.iter().map(|f| f.to_string()).collect(),
        images: vec![image.to_string()],
        status: PropertyStatus::Available,
        featured,
        created_at: now,
        updated_at: now,
    }
}

/// Listings inserted when the catalogue is empty, and served when the
/// database cannot be reached at all.
pub fn sample_properties() -> Vec<Property> {
    let now = Utc::now();

    let mut apartment = listing(
        1,
        "Bright three-room apartment in the old town",
        "Renovated apartment on the third floor with balcony and cellar, a short walk from the main square.",
        285000.0,
        TransactionType::Sale,
        ("Via Roma 12", "Verona", "VR"),
        (2, 1, 95.0),
        &["Balcony", "Cellar", "Elevator", "Autonomous heating"],
        "/images/properties/via-roma-12.jpg",
        true,
        now,
    );
    apartment.floor = Some(3);
    apartment.total_floors = Some(5);
    apartment.year_built = Some(1968);
    apartment.energy_class = Some("C".to_string());

    let mut villa = listing(
        2,
        "Detached villa with garden",
        "Two-level villa surrounded by a private garden, double garage and tavern.",
        640000.0,
        TransactionType::Sale,
        ("Via dei Colli 4", "Padova", "PD"),
        (4, 3, 260.0),
        &["Garden", "Double garage", "Tavern", "Alarm system"],
        "/images/properties/via-dei-colli-4.jpg",
        true,
        now,
    );
    villa.total_floors = Some(2);
    villa.year_built = Some(2004);
    villa.energy_class = Some("B".to_string());

    let mut studio = listing(
        3,
        "Furnished studio near the university",
        "Fully furnished studio, ideal for students, utilities included in the monthly fee.",
        650.0,
        TransactionType::Rental,
        ("Corso Porta Nuova 88", "Verona", "VR"),
        (1, 1, 38.0),
        &["Furnished", "Internet", "Washing machine"],
        "/images/properties/porta-nuova-88.jpg",
        false,
        now,
    );
    studio.floor = Some(1);
    studio.total_floors = Some(4);
    studio.energy_class = Some("D".to_string());

    let mut office = listing(
        4,
        "Office space with private parking",
        "Open-plan office on the ground floor with two private parking spaces.",
        1400.0,
        TransactionType::Rental,
        ("Viale Venezia 150", "Vicenza", "VI"),
        (0, 2, 120.0),
        &["Parking", "Air conditioning", "Reception"],
        "/images/properties/viale-venezia-150.jpg",
        false,
        now,
    );
    office.floor = Some(0);
    office.energy_class = Some("E".to_string());

    vec![apartment, villa, studio, office]
}
