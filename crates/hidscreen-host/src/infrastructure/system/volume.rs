//! Output volume via the platform's mixer command.
//!
//! There is no portable volume API, so this shells out the same way a user
//! would: `osascript` on macOS, `amixer` (ALSA) on Linux, and PowerShell on
//! Windows.  PowerShell has no volume cmdlet, so the Windows script compiles
//! a small Core Audio shim (`IAudioEndpointVolume`) with `Add-Type` and
//! prints the default output endpoint's master level.  Other platforms
//! report the metric as unavailable.

use regex::Regex;
use tokio::process::Command;

use crate::application::monitors::ProbeError;

const METRIC: &str = "volume";

/// Prints the default render endpoint's master volume as a bare integer.
const WINDOWS_VOLUME_SCRIPT: &str = r#"
Add-Type -TypeDefinition @'
using System.Runtime.InteropServices;
[Guid("5CDF2C82-841E-4546-9722-0CF74078229A"), InterfaceType(ComInterfaceType.InterfaceIsIUnknown)]
interface IAudioEndpointVolume {
  int f(); int g(); int h(); int i();
  int SetMasterVolumeLevelScalar(float fLevel, System.Guid pguidEventContext);
  int j();
  int GetMasterVolumeLevelScalar(out float pfLevel);
}
[Guid("D666063F-1587-4E43-81F1-B948E807363F"), InterfaceType(ComInterfaceType.InterfaceIsIUnknown)]
interface IMMDevice {
  int Activate(ref System.Guid id, int clsCtx, int activationParams, out IAudioEndpointVolume aev);
}
[Guid("A95664D2-9614-4F35-A746-DE8DB63617E6"), InterfaceType(ComInterfaceType.InterfaceIsIUnknown)]
interface IMMDeviceEnumerator {
  int f();
  int GetDefaultAudioEndpoint(int dataFlow, int role, out IMMDevice endpoint);
}
[ComImport, Guid("BCDE0395-E52F-467C-8E3D-C4579291692E")] class MMDeviceEnumeratorComObject { }
public class HidscreenAudio {
  public static float Volume() {
    var enumerator = new MMDeviceEnumeratorComObject() as IMMDeviceEnumerator;
    IMMDevice dev = null;
    Marshal.ThrowExceptionForHR(enumerator.GetDefaultAudioEndpoint(0, 1, out dev));
    IAudioEndpointVolume epv = null;
    var epvid = typeof(IAudioEndpointVolume).GUID;
    Marshal.ThrowExceptionForHR(dev.Activate(ref epvid, 23, 0, out epv));
    float v = -1;
    Marshal.ThrowExceptionForHR(epv.GetMasterVolumeLevelScalar(out v));
    return v;
  }
}
'@
[math]::Round([HidscreenAudio]::Volume() * 100)
"#;

fn unavailable(reason: impl Into<String>) -> ProbeError {
    ProbeError::Unavailable {
        metric: METRIC,
        reason: reason.into(),
    }
}

/// Runs the mixer command and parses its output.
pub struct VolumeReader {
    amixer_level: Regex,
}

impl VolumeReader {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            amixer_level: Regex::new(r"\[(\d{1,3})%\]")?,
        })
    }

    pub async fn read_percent(&self) -> Result<f64, ProbeError> {
        if cfg!(target_os = "macos") {
            let out = run("osascript", &["-e", "output volume of (get volume settings)"]).await?;
            parse_bare_volume(&out).ok_or_else(|| unavailable(format!("unexpected output {out:?}")))
        } else if cfg!(target_os = "linux") {
            let out = run("amixer", &["-M", "get", "Master"]).await?;
            self.parse_amixer_volume(&out)
                .ok_or_else(|| unavailable("no level in amixer output"))
        } else if cfg!(target_os = "windows") {
            let out = run(
                "powershell",
                &["-NoProfile", "-NonInteractive", "-Command", WINDOWS_VOLUME_SCRIPT],
            )
            .await?;
            parse_bare_volume(&out).ok_or_else(|| unavailable(format!("unexpected output {out:?}")))
        } else {
            Err(unavailable("no mixer command on this platform"))
        }
    }

    /// Extracts the first `[NN%]` level from `amixer get` output.
    pub fn parse_amixer_volume(&self, output: &str) -> Option<f64> {
        let caps = self.amixer_level.captures(output)?;
        caps[1].parse::<f64>().ok()
    }
}

/// Parses the bare integer printed by `osascript` and the Windows script.
///
/// `osascript` prints `missing value` for some output devices; that and any
/// level outside 0..=100 yield `None`.
pub fn parse_bare_volume(output: &str) -> Option<f64> {
    output
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|level| (0.0..=100.0).contains(level))
}

async fn run(program: &str, args: &[&str]) -> Result<String, ProbeError> {
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| unavailable(format!("{program}: {e}")))?;
    if !output.status.success() {
        return Err(unavailable(format!("{program} exited with {}", output.status)));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
