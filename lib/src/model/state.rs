/// Marker type for a model that is **not yet trained**.
///
/// Used as the state parameter of [`LstmModel`](crate::model::LstmModel):
/// - Training (`Trainer::fit`) requires an `Unfitted` model.
/// - Inference (`predict`) is not available until the model becomes `Fitted`.
#[derive(Debug, Clone, Copy)]
pub struct Unfitted;

/// Marker type for a **trained** model.
///
/// A `Fitted` model carries only the parameters needed for prediction; the
/// optimizer state and training hyperparameters stay with the trainer.
#[derive(Debug, Clone, Copy)]
pub struct Fitted;
