// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

use super::{run_pipeline, CommandLine, PipelineSpec};
use crate::error::{ProbeError, ProbeResult};
use tracing::info;

const KUBECTL: &str = "kubectl";

fn grep_allowing_no_match(pattern: &str) -> CommandLine {
    CommandLine::new("grep")
        .arg(pattern)
        .accept_exit_codes([0, 1])
}

fn first_column() -> CommandLine {
    CommandLine::new("awk").arg("{print $1}")
}

/// `kubectl get pvc -n <namespace> | grep <pod> | awk '{print $1}'`
pub fn pvc_names_spec(namespace: &str, pod: &str) -> PipelineSpec {
    PipelineSpec::new(
        CommandLine::new(KUBECTL).args(["get", "pvc", "-n", namespace]),
        grep_allowing_no_match(pod),
        first_column(),
    )
}

/// `kubectl get pv | grep <namespace>/<pvc> | awk '{print $1}'`
pub fn pv_names_spec(namespace: &str, pvc: &str) -> PipelineSpec {
    PipelineSpec::new(
        CommandLine::new(KUBECTL).args(["get", "pv"]),
        grep_allowing_no_match(&format!("{}/{}", namespace, pvc)),
        first_column(),
    )
}

fn require_non_empty(what: &str, value: &str) -> ProbeResult<()> {
    if value.is_empty() {
        return Err(ProbeError::ConfigError(format!("{} must not be empty", what)));
    }
    Ok(())
}

/// Names of the persistent volume claims whose listing line mentions `pod`.
///
/// The match is a substring match on the whole `kubectl` line, so a claim
/// named after a pod with a longer name is also returned.
pub fn pvc_names_for_pod(namespace: &str, pod: &str) -> ProbeResult<Vec<String>> {
    require_non_empty("namespace", namespace)?;
    require_non_empty("pod name", pod)?;
    run_pipeline(&pvc_names_spec(namespace, pod))
        .map_err(|e| e.context(format!("listing claims of pod '{}/{}'", namespace, pod)))
}

/// Names of the persistent volumes bound to claim `namespace/pvc`.
pub fn pv_names_for_pvc(namespace: &str, pvc: &str) -> ProbeResult<Vec<String>> {
    require_non_empty("namespace", namespace)?;
    require_non_empty("claim name", pvc)?;
    run_pipeline(&pv_names_spec(namespace, pvc))
        .map_err(|e| e.context(format!("listing volumes of claim '{}/{}'", namespace, pvc)))
}

/// Name of the single persistent volume backing `pod`.
///
/// The pod must resolve to exactly one claim and that claim to exactly one
/// volume; anything else is a `VerificationError` listing what was found.
pub fn pv_name_for_pod(namespace: &str, pod: &str) -> ProbeResult<String> {
    resolve_pv_name(namespace, pod, pvc_names_for_pod, pv_names_for_pvc)
}

fn resolve_pv_name<C, V>(namespace: &str, pod: &str, claims: C, volumes: V) -> ProbeResult<String>
where
    C: FnOnce(&str, &str) -> ProbeResult<Vec<String>>,
    V: FnOnce(&str, &str) -> ProbeResult<Vec<String>>,
{
    let pvc = exactly_one(
        "claim",
        &format!("pod '{}/{}'", namespace, pod),
        claims(namespace, pod)?,
    )?;
    let pv = exactly_one(
        "volume",
        &format!("claim '{}/{}'", namespace, pvc),
        volumes(namespace, &pvc)?,
    )?;
    info!("Resolved pod={}/{} to pvc={} pv={}", namespace, pod, pvc, pv);
    Ok(pv)
}

fn exactly_one(kind: &str, owner: &str, mut names: Vec<String>) -> ProbeResult<String> {
    if names.len() == 1 {
        if let Some(name) = names.pop() {
            return Ok(name);
        }
    }
    Err(ProbeError::VerificationError(format!(
        "expected exactly one {} for {}, found {}: [{}]",
        kind,
        owner,
        names.len(),
        names.join(", ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pvc_names_spec() {
        let spec = pvc_names_spec("kibishii", "kibishii-deployment-0");
        let [list, filter, extract] = &spec.stages;

        assert_eq!(list.program, "kubectl");
        assert_eq!(list.args, vec!["get", "pvc", "-n", "kibishii"]);
        assert_eq!(filter.program, "grep");
        assert_eq!(filter.args, vec!["kibishii-deployment-0"]);
        assert_eq!(filter.accepted_exit_codes, vec![0, 1]);
        assert_eq!(extract.to_string(), "awk {print $1}");
        assert_eq!(extract.accepted_exit_codes, vec![0]);
    }

    #[test]
    fn test_pv_names_spec_filters_on_claim_ref() {
        let spec = pv_names_spec("kibishii", "kibishii-data-kibishii-deployment-0");
        let [list, filter, _] = &spec.stages;

        assert_eq!(list.args, vec!["get", "pv"]);
        assert_eq!(filter.args, vec!["kibishii/kibishii-data-kibishii-deployment-0"]);
    }

    #[test]
    fn test_pattern_is_a_single_argument() {
        let spec = pvc_names_spec("ns", "pod with spaces; rm -rf /");
        assert_eq!(spec.stages[1].args, vec!["pod with spaces; rm -rf /"]);
    }

    #[test]
    fn test_empty_names_rejected_before_running() {
        assert!(matches!(
            pvc_names_for_pod("", "pod"),
            Err(ProbeError::ConfigError(_))
        ));
        assert!(matches!(
            pv_names_for_pvc("ns", ""),
            Err(ProbeError::ConfigError(_))
        ));
    }

    fn names(values: &[&str]) -> ProbeResult<Vec<String>> {
        Ok(values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn test_resolve_pv_name_chains_claim_into_volume() {
        let pv = resolve_pv_name(
            "kibishii",
            "kibishii-deployment-0",
            |ns, pod| {
                assert_eq!((ns, pod), ("kibishii", "kibishii-deployment-0"));
                names(&["kibishii-data-kibishii-deployment-0"])
            },
            |ns, pvc| {
                assert_eq!((ns, pvc), ("kibishii", "kibishii-data-kibishii-deployment-0"));
                names(&["pvc-94b9d1a2"])
            },
        )
        .unwrap();
        assert_eq!(pv, "pvc-94b9d1a2");
    }

    #[test]
    fn test_resolve_pv_name_requires_one_claim() {
        for claims in [&[][..], &["data-0", "data-1"][..]] {
            let error = resolve_pv_name(
                "ns",
                "pod-0",
                |_, _| names(claims),
                |_, _| panic!("volume lookup must not run"),
            )
            .unwrap_err();
            match error {
                ProbeError::VerificationError(msg) => {
                    assert!(msg.contains("exactly one claim for pod 'ns/pod-0'"), "{}", msg);
                    assert!(msg.contains(&format!("found {}", claims.len())), "{}", msg);
                }
                other => panic!("Expected VerificationError, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_resolve_pv_name_requires_one_volume() {
        let error = resolve_pv_name(
            "ns",
            "pod-0",
            |_, _| names(&["data-0"]),
            |_, _| names(&["pv-a", "pv-b"]),
        )
        .unwrap_err();
        match error {
            ProbeError::VerificationError(msg) => {
                assert!(msg.contains("exactly one volume for claim 'ns/data-0'"), "{}", msg);
                assert!(msg.contains("[pv-a, pv-b]"), "{}", msg);
            }
            other => panic!("Expected VerificationError, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_pv_name_propagates_lookup_error() {
        let error = resolve_pv_name(
            "ns",
            "pod-0",
            |_, _| {
                Err(ProbeError::PipelineStageError {
                    stage: 1,
                    command: "kubectl get pvc -n ns".to_string(),
                    message: "exited with exit status: 1".to_string(),
                })
            },
            |_, _| panic!("volume lookup must not run"),
        )
        .unwrap_err();
        assert!(matches!(error, ProbeError::PipelineStageError { stage: 1, .. }));
    }

    #[test]
    fn test_pv_name_for_pod_rejects_empty_names() {
        assert!(matches!(
            pv_name_for_pod("ns", ""),
            Err(ProbeError::ConfigError(_))
        ));
    }
}
