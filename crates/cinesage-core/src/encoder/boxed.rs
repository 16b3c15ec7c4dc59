//! BoxEncoder -- object-safe dynamic dispatch wrapper for TextEncoder.
//!
//! 1. Define an object-safe `EncoderDyn` trait with boxed futures
//! 2. Blanket-impl `EncoderDyn` for all `T: TextEncoder`
//! 3. `BoxEncoder` wraps `Box<dyn EncoderDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use cinesage_types::error::EncodeError;

use super::TextEncoder;

/// Object-safe version of [`TextEncoder`] with boxed futures.
///
/// This trait exists solely to enable dynamic dispatch (`dyn EncoderDyn`).
/// A blanket implementation is provided for all types implementing
/// `TextEncoder`.
pub trait EncoderDyn: Send + Sync {
    fn encode_boxed<'a>(
        &'a self,
        texts: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>, EncodeError>> + Send + 'a>>;

    fn model_name_dyn(&self) -> &str;

    fn dimension_dyn(&self) -> usize;
}

/// Blanket implementation: any `TextEncoder` automatically implements
/// `EncoderDyn`.
impl<T: TextEncoder> EncoderDyn for T {
    fn encode_boxed<'a>(
        &'a self,
        texts: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>, EncodeError>> + Send + 'a>> {
        Box::pin(self.encode(texts))
    }

    fn model_name_dyn(&self) -> &str {
        self.model_name()
    }

    fn dimension_dyn(&self) -> usize {
        self.dimension()
    }
}

/// Type-erased text encoder for runtime backend selection.
///
/// Since `TextEncoder` uses RPITIT, it cannot be used as a trait object
/// directly. `BoxEncoder` provides equivalent methods that delegate to
/// the inner `EncoderDyn` trait object, letting the arbitration layer
/// hold local and remote backends uniformly.
pub struct BoxEncoder {
    inner: Box<dyn EncoderDyn + Send + Sync>,
}

impl BoxEncoder {
    /// Wrap a concrete `TextEncoder` in a type-erased box.
    pub fn new<T: TextEncoder + 'static>(encoder: T) -> Self {
        Self {
            inner: Box::new(encoder),
        }
    }

    /// Encode one or more texts into vectors.
    pub async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncodeError> {
        self.inner.encode_boxed(texts).await
    }

    /// The model name behind this encoder.
    pub fn model_name(&self) -> &str {
        self.inner.model_name_dyn()
    }

    /// The native dimensionality of the output vectors.
    pub fn dimension(&self) -> usize {
        self.inner.dimension_dyn()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoDim(usize);

    impl TextEncoder for EchoDim {
        async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncodeError> {
            Ok(texts.iter().map(|_| vec![1.0; self.0]).collect())
        }

        fn model_name(&self) -> &str {
            "echo"
        }

        fn dimension(&self) -> usize {
            self.0
        }
    }

    #[tokio::test]
    async fn test_box_encoder_delegates() {
        let boxed = BoxEncoder::new(EchoDim(4));
        assert_eq!(boxed.model_name(), "echo");
        assert_eq!(boxed.dimension(), 4);

        let out = boxed
            .encode(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].len(), 4);
    }
}
