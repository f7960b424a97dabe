use crate::error::InputError;
use crate::model::ShareMap;

/// Rescale raw share weights so they sum to 1.
///
/// Weights must be finite and non-negative with a positive total. The engine
/// never calls this itself; samplers that only have raw weights call it
/// before handing a share map back.
pub fn normalize_shares(raw_shares: &ShareMap) -> Result<ShareMap, InputError> {
    for (variant, &weight) in raw_shares {
        if !weight.is_finite() || weight < 0.0 {
            return Err(InputError::InvalidWeight {
                variant: variant.clone(),
                weight,
            });
        }
    }

    let total: f64 = raw_shares.values().sum();
    if total.is_infinite() {
        return Err(InputError::WeightTotalOverflow);
    }
    if total <= 0.0 {
        return Err(InputError::AllZeroWeights);
    }

    Ok(raw_shares
        .iter()
        .map(|(variant, weight)| (variant.clone(), weight / total))
        .collect())
}
