//! Enrich stage (§4.5): pure normalization, never rejects.

#[derive(Debug, Clone, Default)]
pub struct EnrichConfig {
    pub fee_multiplier: Option<f64>,
}

pub struct EnrichInput<'a> {
    pub from: Option<&'a str>,
    pub gas_limit: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichedFields {
    pub from_normalized: Option<String>,
    pub fee_ceiling: Option<i64>,
}

pub fn evaluate_enrich(input: &EnrichInput<'_>, cfg: &EnrichConfig) -> EnrichedFields {
    let from_normalized = input.from.map(|a| a.to_lowercase());

    let fee_ceiling = match (input.gas_limit, cfg.fee_multiplier) {
        (Some(gas), Some(multiplier)) => Some((gas as f64 * multiplier).ceil() as i64),
        _ => None,
    };

    EnrichedFields {
        from_normalized,
        fee_ceiling,
    }
}
