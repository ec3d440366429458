//! Activation-token wire format. Tokens are ASCII, colon-delimited, in
//! three forms: `"<step>:<row>:<col>"` for option buttons, `"back:<step>"`,
//! and `"done:<step>"`. Step keys must not contain `:`.

const BACK_PREFIX: &str = "back:";
const DONE_PREFIX: &str = "done:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Back { step: String },
    Done { step: String },
    Button { step: String, row: usize, column: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActivationParseError {
    #[error("activation token `{0}` has the wrong shape")]
    Shape(String),
    #[error("activation token `{token}` has a non-integer index `{index}`")]
    Index { token: String, index: String },
}

impl Activation {
    pub fn parse(token: &str) -> Result<Self, ActivationParseError> {
        let parts: Vec<&str> = token.split(':').collect();
        // The three-part option form wins over the nav prefixes, so a step
        // named `back` or `done` keeps addressable option buttons.
        if let [step, row, column] = parts.as_slice() {
            if let (Ok(row), Ok(column)) = (row.parse::<usize>(), column.parse::<usize>()) {
                return Ok(Self::Button {
                    step: step.to_string(),
                    row,
                    column,
                });
            }
        }
        if let Some(step) = token.strip_prefix(BACK_PREFIX) {
            return Ok(Self::Back {
                step: step.to_string(),
            });
        }
        if let Some(step) = token.strip_prefix(DONE_PREFIX) {
            return Ok(Self::Done {
                step: step.to_string(),
            });
        }
        if let [_, row, column] = parts.as_slice() {
            let index = if row.parse::<usize>().is_err() {
                row
            } else {
                column
            };
            return Err(ActivationParseError::Index {
                token: token.to_string(),
                index: index.to_string(),
            });
        }
        Err(ActivationParseError::Shape(token.to_string()))
    }

    /// The step key the token claims to act on; activations whose claimed
    /// step differs from the user's current step are stale and ignored.
    pub fn step(&self) -> &str {
        match self {
            Self::Back { step } | Self::Done { step } | Self::Button { step, .. } => step,
        }
    }
}

pub fn option_token(step: &str, row: usize, column: usize) -> String {
    format!("{step}:{row}:{column}")
}

pub fn done_token(step: &str) -> String {
    format!("{DONE_PREFIX}{step}")
}

pub fn back_token(step: &str) -> String {
    format!("{BACK_PREFIX}{step}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_three_token_forms() {
        assert_eq!(
            Activation::parse("color:0:1"),
            Ok(Activation::Button {
                step: "color".to_string(),
                row: 0,
                column: 1,
            })
        );
        assert_eq!(
            Activation::parse("back:color"),
            Ok(Activation::Back {
                step: "color".to_string(),
            })
        );
        assert_eq!(
            Activation::parse("done:color"),
            Ok(Activation::Done {
                step: "color".to_string(),
            })
        );
    }

    #[test]
    fn wrong_arity_is_malformed() {
        assert!(matches!(
            Activation::parse("color"),
            Err(ActivationParseError::Shape(_))
        ));
        assert!(matches!(
            Activation::parse("color:1:2:3"),
            Err(ActivationParseError::Shape(_))
        ));
        assert!(matches!(
            Activation::parse(""),
            Err(ActivationParseError::Shape(_))
        ));
    }

    #[test]
    fn option_tokens_win_over_nav_prefixes_for_reserved_step_names() {
        assert_eq!(
            Activation::parse("done:0:1"),
            Ok(Activation::Button {
                step: "done".to_string(),
                row: 0,
                column: 1,
            })
        );
        assert_eq!(
            Activation::parse("back:2:0"),
            Ok(Activation::Button {
                step: "back".to_string(),
                row: 2,
                column: 0,
            })
        );
        // Two-part tokens stay navigation even for numeric step keys.
        assert_eq!(
            Activation::parse("done:7"),
            Ok(Activation::Done {
                step: "7".to_string(),
            })
        );
    }

    #[test]
    fn non_integer_indices_are_malformed() {
        assert!(matches!(
            Activation::parse("color:one:2"),
            Err(ActivationParseError::Index { .. })
        ));
        assert!(matches!(
            Activation::parse("color:0:-1"),
            Err(ActivationParseError::Index { .. })
        ));
    }

    #[test]
    fn builders_round_trip_through_parse() {
        assert_eq!(
            Activation::parse(&option_token("step", 2, 3)),
            Ok(Activation::Button {
                step: "step".to_string(),
                row: 2,
                column: 3,
            })
        );
        assert_eq!(
            Activation::parse(&done_token("step")).map(|a| a.step().to_string()),
            Ok("step".to_string())
        );
        assert_eq!(
            Activation::parse(&back_token("step")).map(|a| a.step().to_string()),
            Ok("step".to_string())
        );
    }
}
