//! Erase command construction
//!
//! Pure translation from (device path, [`SanitizeSpec`]) to the ordered list
//! of commands the executor runs. No side effects and no failure paths:
//! invalid spec values are a precondition violation handled upstream.

use crate::config::{SanitizeDataSource, SanitizeMethod, SanitizeSpec};

/// Utility used for multi-pass overwrites.
const COMPLETE_SHRED_UTILITY: &str = "shred";

/// Volume-manager CLI used for container destruction.
const VOLUME_MANAGER_UTILITY: &str = "ceph-volume";

// =============================================================================
// Shred command
// =============================================================================

/// A single erase command: program name plus ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShredCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ShredCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl std::fmt::Display for ShredCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.program, self.args.join(" "))
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Build the erase command sequence for one device region.
///
/// Both methods produce exactly one command per device; what varies is the
/// flag set and iteration count, not the command count.
pub fn build_shred_commands(device: &str, spec: &SanitizeSpec) -> Vec<ShredCommand> {
    match spec.method {
        SanitizeMethod::Quick => vec![quick_destroy_command(device)],
        SanitizeMethod::Complete => vec![ShredCommand::new(
            COMPLETE_SHRED_UTILITY,
            build_shred_args(device, spec),
        )],
    }
}

/// Fast reclamation: ask the volume manager to destroy and zap the device.
fn quick_destroy_command(device: &str) -> ShredCommand {
    ShredCommand::new(
        VOLUME_MANAGER_UTILITY,
        vec!["lvm".to_string(), "zap".to_string(), device.to_string()],
    )
}

fn build_shred_args(device: &str, spec: &SanitizeSpec) -> Vec<String> {
    let mut args = Vec::new();

    // A random-filled device reveals that random data was written; a trailing
    // zero pass masks it.
    if spec.data_source != SanitizeDataSource::Zero {
        args.push("--zero".to_string());
    }

    // Zero-fill every pass by pointing the randomness source at /dev/zero.
    if spec.data_source == SanitizeDataSource::Zero {
        args.push(format!(
            "--random-source={}",
            SanitizeDataSource::Zero.device_path()
        ));
    }

    args.extend([
        "--force".to_string(),
        "--verbose".to_string(),
        format!("--iterations={}", spec.iterations),
        device.to_string(),
    ]);

    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SanitizeDataSource, SanitizeMethod, SanitizeSpec};

    fn complete_spec(data_source: SanitizeDataSource, iterations: u32) -> SanitizeSpec {
        SanitizeSpec {
            method: SanitizeMethod::Complete,
            data_source,
            iterations,
        }
    }

    #[test]
    fn test_quick_method_destroys_container() {
        let spec = SanitizeSpec {
            method: SanitizeMethod::Quick,
            ..Default::default()
        };

        let commands = build_shred_commands("/dev/sdb", &spec);

        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].program, "ceph-volume");
        assert_eq!(commands[0].args, vec!["lvm", "zap", "/dev/sdb"]);
    }

    #[test]
    fn test_complete_zero_source_uses_random_source_flag() {
        let commands =
            build_shred_commands("/dev/sdb", &complete_spec(SanitizeDataSource::Zero, 1));

        assert_eq!(commands.len(), 1);
        let args = &commands[0].args;
        assert_eq!(commands[0].program, "shred");
        assert!(args.contains(&"--random-source=/dev/zero".to_string()));
        assert!(!args.contains(&"--zero".to_string()));
    }

    #[test]
    fn test_complete_random_source_appends_trailing_zero_pass() {
        let commands =
            build_shred_commands("/dev/sdb", &complete_spec(SanitizeDataSource::Random, 1));

        let args = &commands[0].args;
        assert!(args.contains(&"--zero".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("--random-source=")));
    }

    #[test]
    fn test_complete_args_order_and_tail() {
        let commands =
            build_shred_commands("/dev/sdc1", &complete_spec(SanitizeDataSource::Zero, 3));

        assert_eq!(
            commands[0].args,
            vec![
                "--random-source=/dev/zero",
                "--force",
                "--verbose",
                "--iterations=3",
                "/dev/sdc1",
            ]
        );
    }

    #[test]
    fn test_display_renders_full_invocation() {
        let command = quick_destroy_command("/dev/sdb");
        assert_eq!(command.to_string(), "ceph-volume lvm zap /dev/sdb");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn spec_strategy() -> impl Strategy<Value = SanitizeSpec> {
            (
                prop_oneof![Just(SanitizeMethod::Quick), Just(SanitizeMethod::Complete)],
                prop_oneof![
                    Just(SanitizeDataSource::Zero),
                    Just(SanitizeDataSource::Random)
                ],
                1u32..=100,
            )
                .prop_map(|(method, data_source, iterations)| SanitizeSpec {
                    method,
                    data_source,
                    iterations,
                })
        }

        proptest! {
            /// Exactly one command is produced for any spec.
            #[test]
            fn prop_exactly_one_command(spec in spec_strategy()) {
                let commands = build_shred_commands("/dev/sdb", &spec);
                prop_assert_eq!(commands.len(), 1);
            }

            /// The target device is always the final argument.
            #[test]
            fn prop_device_is_last_argument(spec in spec_strategy()) {
                let commands = build_shred_commands("/dev/sdb", &spec);
                prop_assert_eq!(commands[0].args.last().unwrap(), "/dev/sdb");
            }

            /// The complete method always echoes the configured iteration count.
            #[test]
            fn prop_iterations_echoed(
                data_source in prop_oneof![
                    Just(SanitizeDataSource::Zero),
                    Just(SanitizeDataSource::Random)
                ],
                iterations in 1u32..=10_000,
            ) {
                let spec = SanitizeSpec {
                    method: SanitizeMethod::Complete,
                    data_source,
                    iterations,
                };
                let commands = build_shred_commands("/dev/sdb", &spec);
                let wanted = format!("--iterations={iterations}");
                prop_assert!(commands[0].args.contains(&wanted));
            }

            /// The two data-source flags are mutually exclusive.
            #[test]
            fn prop_data_source_flags_exclusive(spec in spec_strategy()) {
                let commands = build_shred_commands("/dev/sdb", &spec);
                let args = &commands[0].args;
                let zero_pass = args.iter().any(|a| a == "--zero");
                let zero_source = args.iter().any(|a| a.starts_with("--random-source="));
                prop_assert!(!(zero_pass && zero_source));
            }
        }
    }
}
