use anyhow::{Result, ensure};
use candle_core::{DType, Tensor};

/// Average of the token states the mask keeps: `[B,T,H] -> [B,H]`.
pub fn mean_pool(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (_, _, width) = hidden.dims3()?;
    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let summed = hidden.broadcast_mul(&mask.unsqueeze(2)?)?.sum(1)?;
    let counts = mask.sum_keepdim(1)?;
    let pooled = summed.broadcast_div(&counts)?;
    ensure!(pooled.dim(1)? == width, "pooled width {} != hidden width {}", pooled.dim(1)?, width);
    Ok(pooled)
}

/// Row-wise unit length for a `[B,H]` tensor.
pub fn l2_normalize(rows: &Tensor) -> Result<Tensor> {
    ensure!(rows.rank() == 2, "expected [B,H], got {:?}", rows.dims());
    let eps = if rows.dtype() == DType::F16 { 1e-6 } else { 1e-12 };
    let norms = (rows.sqr()?.sum_keepdim(1)?.sqrt()? + eps)?;
    Ok(rows.broadcast_div(&norms)?)
}

/// Sentence embedding used by e5 models: masked mean, then L2.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    ensure!(hidden.rank() == 3, "hidden shape must be [B,T,H], got {:?}", hidden.dims());
    l2_normalize(&mean_pool(hidden, attention_mask)?)
}
