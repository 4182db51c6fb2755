use crate::model::{Condition, NormalizedSample, RawSample};

/// Map a provider condition code to a canonical condition and its icon tag.
///
/// Total over all inputs: codes outside the table fall back to
/// [`Condition::Clear`], so new provider codes never break the pipeline.
pub fn normalize(code: &str) -> (Condition, &'static str) {
    let condition = match code {
        "01d" | "01n" => Condition::Clear,
        "02d" | "02n" => Condition::PartlyCloudy,
        "03d" | "03n" | "04d" | "04n" => Condition::Cloudy,
        "09d" | "09n" | "10d" | "10n" => Condition::Rain,
        "11d" | "11n" => Condition::HeavyRain,
        "13d" | "13n" => Condition::Snow,
        "50d" | "50n" => Condition::Fog,
        _ => Condition::Clear,
    };

    (condition, condition.icon())
}

pub fn normalize_sample(raw: RawSample) -> NormalizedSample {
    let (condition, icon) = normalize(&raw.condition_code);
    NormalizedSample { raw, condition, icon }
}
