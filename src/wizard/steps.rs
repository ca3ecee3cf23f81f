use std::fmt;

/// Wizard screens, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    Login,
    Profile,
    Reading,
    Vowels,
    Done,
}

impl WizardStep {
    pub fn next(self) -> Self {
        match self {
            WizardStep::Login => WizardStep::Profile,
            WizardStep::Profile => WizardStep::Reading,
            WizardStep::Reading => WizardStep::Vowels,
            WizardStep::Vowels | WizardStep::Done => WizardStep::Done,
        }
    }

    /// Position in the 1-2-3 stepper; login and done are outside it
    pub fn stepper_position(self) -> Option<u8> {
        match self {
            WizardStep::Profile => Some(1),
            WizardStep::Reading => Some(2),
            WizardStep::Vowels => Some(3),
            WizardStep::Login | WizardStep::Done => None,
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardStep::Login => write!(f, "Login"),
            WizardStep::Profile => write!(f, "Profile"),
            WizardStep::Reading => write!(f, "Reading"),
            WizardStep::Vowels => write!(f, "Vowels"),
            WizardStep::Done => write!(f, "Done"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_advance_in_order() {
        let mut step = WizardStep::Login;
        let mut seen = vec![step];
        while step != WizardStep::Done {
            step = step.next();
            seen.push(step);
        }

        assert_eq!(
            seen,
            vec![
                WizardStep::Login,
                WizardStep::Profile,
                WizardStep::Reading,
                WizardStep::Vowels,
                WizardStep::Done
            ]
        );
        assert_eq!(WizardStep::Done.next(), WizardStep::Done);
        assert_eq!(WizardStep::Vowels.stepper_position(), Some(3));
    }
}
