/// Canonical weather condition shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Condition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Rain,
    HeavyRain,
    Snow,
    Fog,
}

impl Condition {
    /// Icon tag consumed by the rendering layer.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Clear => "sunny",
            Self::PartlyCloudy => "partly-cloudy",
            Self::Cloudy => "cloudy",
            Self::Rain => "rainy",
            Self::HeavyRain => "heavy-rain",
            Self::Snow => "snowy",
            Self::Fog => "foggy",
        }
    }
}

/// One provider observation, as fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    /// Provider date/time label, e.g. "2025-06-01 12:00:00".
    pub timestamp_label: String,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    /// Opaque provider code, e.g. "10d".
    pub condition_code: String,
    /// Provider's short condition text, e.g. "Rain".
    pub description: String,
    pub wind_speed_mps: Option<f64>,
}

impl RawSample {
    /// Calendar date portion of the provider label. The label is trusted as-is;
    /// it is never recomputed from epoch time.
    pub fn date_key(&self) -> &str {
        self.timestamp_label
            .split([' ', 'T'])
            .next()
            .unwrap_or(&self.timestamp_label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSample {
    pub raw: RawSample,
    pub condition: Condition,
    pub icon: &'static str,
}

/// Samples sharing one calendar date, in fetch order.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket {
    pub date: String,
    pub samples: Vec<NormalizedSample>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub date: String,
    /// "Today", "Tomorrow" or a weekday name.
    pub day_label: String,
    pub high_c: f64,
    pub low_c: f64,
    pub avg_humidity_pct: u8,
    pub condition: Condition,
    pub description: String,
}

impl DailySummary {
    pub fn icon(&self) -> &'static str {
        self.condition.icon()
    }
}

/// Snapshot of the weather right now. Replaced wholesale on every successful fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    /// "City, CC"
    pub location: String,
    pub temperature_c: f64,
    pub feels_like_c: Option<f64>,
    pub condition: Condition,
    pub description: String,
    pub humidity_pct: u8,
    pub wind_speed_kmh: f64,
    pub visibility_km: f64,
    pub pressure_hpa: Option<u32>,
}

impl CurrentConditions {
    pub fn icon(&self) -> &'static str {
        self.condition.icon()
    }
}
