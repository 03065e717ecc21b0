//! Vehicle category detection.

use serde::{Deserialize, Serialize};

/// Broad vehicle category used to label results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum VehicleCategory {
    #[default]
    Car,
    Motorcycle,
    Truck,
    Van,
}

impl VehicleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleCategory::Car => "car",
            VehicleCategory::Motorcycle => "motorcycle",
            VehicleCategory::Truck => "truck",
            VehicleCategory::Van => "van",
        }
    }

    /// Parse a stored category label. Unknown labels fall back to `Car`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "motorcycle" => VehicleCategory::Motorcycle,
            "truck" => VehicleCategory::Truck,
            "van" => VehicleCategory::Van,
            _ => VehicleCategory::Car,
        }
    }
}

impl std::fmt::Display for VehicleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const MOTORCYCLE_KEYWORDS: &[&str] = &[
    "moto",
    "motocicleta",
    "scooter",
    "trail",
    "custom",
    "naked",
    "sport",
    // brands
    "yamaha",
    "honda",
    "suzuki",
    "kawasaki",
    "ducati",
    "bmw",
    "harley",
    "triumph",
    "ktm",
];

const TRUCK_KEYWORDS: &[&str] = &["caminhao", "caminhão", "truck", "cargo", "iveco", "scania", "volvo", "mercedes"];

const VAN_KEYWORDS: &[&str] = &["van", "onibus", "ônibus", "bus", "sprinter", "ducato"];

/// Detect the vehicle category with case-insensitive substring tests.
///
/// Categories are checked motorcycle, truck, van in that order and the
/// first hit wins; anything else is a car.
pub fn detect_vehicle_category(raw: &str) -> VehicleCategory {
    let name = raw.to_lowercase();
    let hit = |keywords: &[&str]| keywords.iter().any(|k| name.contains(k));

    if hit(MOTORCYCLE_KEYWORDS) {
        VehicleCategory::Motorcycle
    } else if hit(TRUCK_KEYWORDS) {
        VehicleCategory::Truck
    } else if hit(VAN_KEYWORDS) {
        VehicleCategory::Van
    } else {
        VehicleCategory::Car
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motorcycle_by_brand() {
        assert_eq!(detect_vehicle_category("Yamaha R3 2016/2017 vermelha ABS"), VehicleCategory::Motorcycle);
        assert_eq!(detect_vehicle_category("KTM Duke 390"), VehicleCategory::Motorcycle);
    }

    #[test]
    fn test_motorcycle_by_keyword() {
        assert_eq!(detect_vehicle_category("Scooter eletrico"), VehicleCategory::Motorcycle);
    }

    #[test]
    fn test_truck() {
        assert_eq!(detect_vehicle_category("Scania R450 cavalo"), VehicleCategory::Truck);
        assert_eq!(detect_vehicle_category("CAMINHÃO baú"), VehicleCategory::Truck);
    }

    #[test]
    fn test_van() {
        assert_eq!(detect_vehicle_category("Fiat Ducato Minibus"), VehicleCategory::Van);
    }

    #[test]
    fn test_car_default() {
        assert_eq!(detect_vehicle_category("Chevrolet Onix 2019 branco completo"), VehicleCategory::Car);
        assert_eq!(detect_vehicle_category(""), VehicleCategory::Car);
    }

    #[test]
    fn test_priority_motorcycle_over_truck() {
        // "sport" (motorcycle) and "cargo" (truck) both match
        assert_eq!(detect_vehicle_category("sport cargo"), VehicleCategory::Motorcycle);
    }

    #[test]
    fn test_priority_truck_over_van() {
        // "Mercedes Sprinter" hits both the truck and the van sets
        assert_eq!(detect_vehicle_category("Mercedes Sprinter 415"), VehicleCategory::Truck);
    }

    #[test]
    fn test_label_round_trip() {
        for category in
            [VehicleCategory::Car, VehicleCategory::Motorcycle, VehicleCategory::Truck, VehicleCategory::Van]
        {
            assert_eq!(VehicleCategory::from_label(category.as_str()), category);
        }
        assert_eq!(VehicleCategory::from_label("boat"), VehicleCategory::Car);
    }
}
