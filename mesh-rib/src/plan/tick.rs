use crate::propagation::Propagation;
use crate::state::State;

/// `Tick`: a no-op as far as the RIB is concerned. It exists so the
/// Session Manager has a recurring action to hang redial/keepalive work
/// off of; the RIB itself has nothing time-based to do.
pub fn tick(_state: &State) -> Vec<Propagation> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_produces_no_propagations() {
        let state = State::new();
        assert!(tick(&state).is_empty());
    }
}
