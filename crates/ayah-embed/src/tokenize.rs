use anyhow::{Result, anyhow};
use candle_core::{Device, DType, Tensor};
use tokenizers::Tokenizer;

/// Model inputs for one text, each shaped `[1, T]`.
pub struct Encoded {
    pub input_ids: Tensor,
    pub attention_mask: Tensor,
    pub token_type_ids: Tensor,
}

/// Encodes with special tokens and truncates to `max_len`. No padding: a
/// single sequence needs none.
pub fn encode(tokenizer: &Tokenizer, text: &str, max_len: usize, device: &Device) -> Result<Encoded> {
    let enc = tokenizer.encode(text, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let len = enc.get_ids().len().min(max_len);
    let ids = &enc.get_ids()[..len];
    let mask = &enc.get_attention_mask()[..len];
    Ok(Encoded {
        input_ids: Tensor::new(ids, device)?.unsqueeze(0)?,
        attention_mask: Tensor::new(mask, device)?.unsqueeze(0)?,
        token_type_ids: Tensor::zeros((1, len), DType::I64, device)?,
    })
}
