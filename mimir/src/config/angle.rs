//! Serde helpers for angles that are stored in degrees but used in radians.

/// Use with `#[serde(with = "degrees")]` on an `f32` field holding radians.
pub mod degrees {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(radians: &f32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f32(radians.to_degrees())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        f32::deserialize(deserializer).map(f32::to_radians)
    }
}

/// Isometries stored as `{ translation = [x, y], rotation = degrees }`.
pub mod isometry_with_angle {
    use nalgebra::{Isometry, Isometry2, UnitComplex};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Stored {
        translation: [f32; 2],
        rotation: f32,
    }

    pub fn serialize<S: Serializer>(
        isometry: &Isometry2<f32>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        Stored {
            translation: [isometry.translation.x, isometry.translation.y],
            rotation: isometry.rotation.angle().to_degrees(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Isometry2<f32>, D::Error> {
        let stored = Stored::deserialize(deserializer)?;

        Ok(Isometry::from_parts(
            stored.translation.into(),
            UnitComplex::new(stored.rotation.to_radians()),
        ))
    }
}
