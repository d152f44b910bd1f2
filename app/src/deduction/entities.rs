use crate::credits::Credits;

/// Proof of an applied deduction. `previous_credits - deducted` always
/// equals `new_credits`; partial application does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub previous_credits: Credits,
    pub deducted: Credits,
    pub new_credits: Credits,
}
