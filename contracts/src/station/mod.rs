pub mod get_stations;

#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Geo {
    pub lat: f64,
    pub lon: f64,
}

impl Geo {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// An upcoming stop of a train, as shown to a passenger.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct Station {
    pub id: String,
    pub title: String,
    pub is_coffee: bool,
    pub is_food: bool,
    pub geo: Geo,
    /// Seconds until the train arrives at this station.
    pub time: i64,
}

impl Station {
    pub fn new(
        id: String,
        title: String,
        is_coffee: bool,
        is_food: bool,
        geo: Geo,
        time: i64,
    ) -> Self {
        Self {
            id,
            title,
            is_coffee,
            is_food,
            geo,
            time,
        }
    }
}
