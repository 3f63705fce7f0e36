//! High-risk command signatures.
//!
//! A match here denies without consulting any LLM. The corpus walks in a
//! fixed family order (reverse shells, data exfiltration, crypto miners,
//! obfuscated execution, destructive operations, self-protection) and returns
//! the first hit. Self-protection patterns anchor to command position (start
//! of command or after a separator) so quoted strings and echoed text don't
//! trip them.

use std::sync::LazyLock;

use crate::patterns::{RiskPattern, Severity};

static HIGH_RISK: LazyLock<Vec<RiskPattern>> = LazyLock::new(|| {
    let mut corpus = Vec::new();
    corpus.extend(reverse_shell_patterns());
    corpus.extend(data_exfil_patterns());
    corpus.extend(crypto_miner_patterns());
    corpus.extend(obfuscated_exec_patterns());
    corpus.extend(destructive_patterns());
    corpus.extend(self_protection_patterns());
    corpus
});

fn reverse_shell_patterns() -> Vec<RiskPattern> {
    vec![
        RiskPattern::new(
            "shell_dev_tcp",
            r"(?i)\b(ba|z|da)?sh\s+-i\s*>?&?\s*/dev/(tcp|udp)/",
            Severity::Critical,
            "interactive shell bound to a network socket",
            "Opens a reverse shell giving a remote party full control of this machine.",
            &["penetration testing you are running yourself"],
        ),
        RiskPattern::new(
            "dev_tcp_endpoint",
            r"(?i)/dev/(tcp|udp)/[^\s/]+/\d+",
            Severity::Critical,
            "raw network connection via /dev/tcp",
            "Bash's /dev/tcp devices make arbitrary outbound connections with no tooling installed.",
            &["quick port-reachability checks"],
        ),
        RiskPattern::new(
            "nc_exec_shell",
            r"(?i)\b(nc|ncat|netcat)\b[^|;&]*\s-(e|c)\s*\S",
            Severity::Critical,
            "netcat spawning a program on connect",
            "nc -e wires a shell to the network, the textbook reverse shell.",
            &["network debugging in a lab you control"],
        ),
        RiskPattern::new(
            "socat_exec_shell",
            r"(?i)\bsocat\b[^|;&]*\b(exec|system):",
            Severity::Critical,
            "socat EXEC/SYSTEM address",
            "socat exec: connects a spawned process to an arbitrary remote endpoint.",
            &["serial/socket bridging on your own infrastructure"],
        ),
        RiskPattern::new(
            "python_reverse_shell",
            r"(?i)python[23]?\s+-c.*socket.*(dup2|pty\.spawn|subprocess|os\.system)",
            Severity::Critical,
            "Python one-liner reverse shell",
            "Builds a socket-backed shell in one line, bypassing any nc/socat checks.",
            &["authorized red-team exercises"],
        ),
        RiskPattern::new(
            "perl_reverse_shell",
            r"(?i)\bperl\s+-e.*socket.*(exec|open\s*\()",
            Severity::Critical,
            "Perl one-liner reverse shell",
            "Classic perl socket shell; remote party gets your shell prompt.",
            &["authorized red-team exercises"],
        ),
        RiskPattern::new(
            "ruby_reverse_shell",
            r"(?i)\bruby\s+(-rsocket|-e.*TCPSocket)",
            Severity::Critical,
            "Ruby socket shell one-liner",
            "Opens an outbound TCP shell using only the Ruby runtime.",
            &["authorized red-team exercises"],
        ),
        RiskPattern::new(
            "php_reverse_shell",
            r"(?i)\bphp\s+-r.*fsockopen",
            Severity::Critical,
            "PHP fsockopen shell one-liner",
            "Connects PHP to a remote socket and typically pipes a shell through it.",
            &["authorized red-team exercises"],
        ),
        RiskPattern::new(
            "telnet_pipe_shell",
            r"(?i)\btelnet\b[^|;&]*\|\s*(/bin/)?(ba|z)?sh\b",
            Severity::Critical,
            "telnet piped into a shell",
            "Remote bytes become local commands the moment the connection opens.",
            &[],
        ),
        RiskPattern::new(
            "mkfifo_backpipe",
            r"(?i)\bmkfifo\b\s+\S+.*\|\s*(nc|ncat|netcat|(/bin/)?sh)\b",
            Severity::Critical,
            "named-pipe shell relay",
            "The fifo backpipe pattern stitches nc and a shell into a full duplex remote session.",
            &[],
        ),
    ]
}

fn data_exfil_patterns() -> Vec<RiskPattern> {
    vec![
        RiskPattern::new(
            "network_tool_secret_variable",
            r"(?i)\b(curl|wget|nc|ncat)\b[^|;&]*\$\{?[a-z0-9_]*(key|secret|token|password|credential)[a-z0-9_]*\}?",
            Severity::Critical,
            "network request carrying a secret environment variable",
            "Expands a credential into a network request, sending it to whoever controls the destination.",
            &["calling an API you configured with that credential"],
        ),
        RiskPattern::new(
            "env_piped_to_network",
            r"(?i)\benv\s*\|\s*(curl|wget|nc|ncat)\b",
            Severity::Critical,
            "entire environment piped to the network",
            "Ships every environment variable, credentials included, off the machine.",
            &[],
        ),
        RiskPattern::new(
            "printenv_piped_to_network",
            r"(?i)\bprintenv\b[^|;&]*\|\s*(curl|nc|wget)\b",
            Severity::Critical,
            "printenv output piped to the network",
            "Same as env piping: wholesale credential exfiltration.",
            &[],
        ),
        RiskPattern::new(
            "private_key_piped_to_network",
            r"(?i)\bcat\b[^|;&]*(id_rsa|id_ed25519|id_ecdsa|id_dsa|\.pem|private[_-]?key)[^|;&]*\|\s*(curl|nc|wget)\b",
            Severity::Critical,
            "private key piped to the network",
            "Reads a private key and uploads it; the key is compromised the moment this runs.",
            &[],
        ),
        RiskPattern::new(
            "dns_tunnel",
            r"(?i)(\b(dig|nslookup|host)\b[^|;&]*\$[({])|(\b(base32|base64|xxd)\b[^|;&]*\|\s*(xargs\s+)?(dig|nslookup)\b)",
            Severity::Critical,
            "data smuggled through DNS queries",
            "Encodes data into DNS lookups, exfiltrating through firewalls that allow DNS.",
            &["DNS debugging with dynamic hostnames"],
        ),
        RiskPattern::new(
            "scp_outbound",
            r"(?i)\bscp\b\s+(-[a-zA-Z0-9]+\s+)*[^-\s][^\s]*\s+[a-z0-9_.-]+@[a-z0-9.-]+:",
            Severity::Critical,
            "file copied to a remote host via scp",
            "Pushes local files to a remote machine; fine for your servers, exfiltration otherwise.",
            &["deploying to a host you administer"],
        ),
        RiskPattern::new(
            "rsync_outbound",
            r"(?i)\brsync\b[^|;&]*\s[a-z0-9_.-]+@[a-z0-9.-]+:",
            Severity::Critical,
            "directory synced to a remote host via rsync",
            "Bulk-copies local data to a remote machine.",
            &["backups or deploys to a host you administer"],
        ),
    ]
}

fn crypto_miner_patterns() -> Vec<RiskPattern> {
    vec![
        RiskPattern::new(
            "miner_binary",
            r"(?i)\b(xmrig|minerd|cgminer|bfgminer|cpuminer|ethminer|nbminer|t-rex|lolminer|phoenixminer)\b",
            Severity::High,
            "known cryptocurrency miner",
            "Burns your CPU/GPU and power budget mining coins for someone else.",
            &["mining on hardware you own, on purpose"],
        ),
        RiskPattern::new(
            "stratum_endpoint",
            r"(?i)stratum\+(tcp|ssl)://",
            Severity::High,
            "stratum mining-pool protocol endpoint",
            "stratum:// URLs exist only to connect miners to pools.",
            &[],
        ),
        RiskPattern::new(
            "mining_pool_host",
            r"(?i)\b(minexmr\.com|nanopool\.org|f2pool\.com|2miners\.com|supportxmr\.com|hashvault\.pro)\b",
            Severity::High,
            "known mining-pool host",
            "Traffic to mining pools means this machine is about to mine for someone.",
            &[],
        ),
    ]
}

fn obfuscated_exec_patterns() -> Vec<RiskPattern> {
    vec![
        RiskPattern::new(
            "base64_decode_to_shell",
            r"(?i)base64\s+(-d|--decode|-D)\b[^|;&]*\|\s*(ba|z)?sh\b",
            Severity::High,
            "base64-decoded payload piped to a shell",
            "Hides the real command from review; whatever was encoded runs sight unseen.",
            &["unpacking a payload you encoded yourself"],
        ),
        RiskPattern::new(
            "eval_of_base64",
            r"(?i)(eval[^;&]*base64)|(base64[^;&|]*\|\s*eval\b)",
            Severity::High,
            "eval over base64-decoded content",
            "Executes decoded text directly, a standard obfuscation wrapper for malware droppers.",
            &[],
        ),
        RiskPattern::new(
            "long_blob_decode",
            r#"(?i)echo\s+["']?[a-z0-9+/=]{40,}["']?\s*\|\s*base64"#,
            Severity::High,
            "long opaque blob being decoded",
            "A long inline base64 blob is how obfuscated payloads travel inside innocent-looking commands.",
            &["decoding data you encoded for transport"],
        ),
        RiskPattern::new(
            "hex_revert_to_shell",
            r"(?i)\bxxd\s+-r\b[^|;&]*\|\s*(ba|z)?sh\b",
            Severity::High,
            "hex-decoded payload piped to a shell",
            "Same trick as base64 piping, using hex instead.",
            &[],
        ),
        RiskPattern::new(
            "printf_escapes_to_shell",
            r"(?i)\bprintf\b[^|;&]*\\x[0-9a-f]{2}[^|;&]*\|\s*(ba|z)?sh\b",
            Severity::High,
            "escape-sequence payload piped to a shell",
            "Builds a hidden command byte by byte, then runs it.",
            &[],
        ),
        RiskPattern::new(
            "python_dynamic_exec",
            r"(?i)python[23]?\s+-c[^|;&]*(exec|eval)\s*\([^)]*(base64|b64decode|decode|compile)",
            Severity::High,
            "Python exec/eval over decoded content",
            "Runs code that was deliberately hidden from static inspection.",
            &[],
        ),
    ]
}

fn destructive_patterns() -> Vec<RiskPattern> {
    vec![
        // Destructive patterns stay case-sensitive: they key on exact
        // punctuation and these tools are invoked lowercase.
        RiskPattern::new(
            "rm_root",
            r"\brm\s+(-[a-zA-Z-]+\s+)+/\s*($|[;&|])",
            Severity::Critical,
            "recursive deletion of the filesystem root",
            "Destroys the operating system and all data; machines rarely survive it.",
            &[],
        ),
        RiskPattern::new(
            "rm_home",
            r#"\brm\s+(-[a-zA-Z-]+\s+)+(~/?|"?\$HOME"?/?)\s*($|[;&|])"#,
            Severity::Critical,
            "recursive deletion of the home directory",
            "Deletes every personal file, key, and config the user owns.",
            &[],
        ),
        RiskPattern::new(
            "rm_glob_all",
            r"\brm\s+(-[a-zA-Z-]+\s+)+\*",
            Severity::Critical,
            "recursive deletion via bare wildcard",
            "Deletes everything in the current directory tree, wherever that happens to be.",
            &["clearing a scratch directory you just created"],
        ),
        RiskPattern::new(
            "rm_no_preserve_root",
            r"\brm\s+[^;|&]*--no-preserve-root",
            Severity::Critical,
            "rm with root protection disabled",
            "The flag exists solely to defeat the last safety net before deleting /.",
            &[],
        ),
        RiskPattern::new(
            "mkfs_device",
            r"(?i)\bmkfs(\.[a-z0-9]+)?\s+[^;|&]*/dev/",
            Severity::Critical,
            "filesystem creation over a device",
            "Formatting a device erases everything on it immediately.",
            &["provisioning a new disk you intend to format"],
        ),
        RiskPattern::new(
            "dd_to_disk",
            r"(?i)\bdd\b[^;|&]*\bof=/dev/(sd|hd|nvme|vd|xvd|mmcblk|disk)",
            Severity::Critical,
            "raw write to a disk device",
            "dd onto a disk overwrites partitions and data with no undo.",
            &["writing an installer image to a USB stick on purpose"],
        ),
        RiskPattern::new(
            "fork_bomb",
            r":\(\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:",
            Severity::Critical,
            "fork bomb",
            "Spawns processes until the machine locks up.",
            &[],
        ),
        RiskPattern::new(
            "chmod_777_root",
            r"\bchmod\s+(-[a-zA-Z]+\s+)*-R\s+777\s+/\s*($|[;&|])",
            Severity::Critical,
            "recursive world-writable permissions on /",
            "Makes every file on the system writable by anyone, unrecoverable without a rebuild.",
            &[],
        ),
        RiskPattern::new(
            "chown_recursive_root",
            r"\bchown\s+(-[a-zA-Z]+\s+)*-?R\s+\S+\s+/\s*($|[;&|])",
            Severity::Critical,
            "recursive ownership change on /",
            "Reassigning ownership of the whole filesystem breaks the OS and every service on it.",
            &[],
        ),
    ]
}

fn self_protection_patterns() -> Vec<RiskPattern> {
    vec![
        RiskPattern::new(
            "guard_uninstall",
            r"(?i)(^|[;&|]\s*)clawguard\s+uninstall\b",
            Severity::Critical,
            "attempt to uninstall this guard",
            "An agent removing its own safety hook is the first step of every escape.",
            &["the operator intentionally removing clawguard"],
        ),
        RiskPattern::new(
            "guard_file_removal",
            r"(?i)(^|[;&|]\s*)rm\s+[^;|&]*\.clawguard",
            Severity::Critical,
            "deletion of this guard's files",
            "Deleting guard state disables the checks protecting this session.",
            &["the operator intentionally removing clawguard"],
        ),
        RiskPattern::new(
            "guard_process_kill",
            r"(?i)((^|[;&|]\s*)(pkill|killall)\s+[^;|&]*clawguard)|(\bkill\s+[^;|&]*\$\(\s*pgrep\s+[^)]*clawguard)",
            Severity::Critical,
            "attempt to kill the guard process",
            "Killing the guard mid-decision leaves the request unreviewed.",
            &[],
        ),
        RiskPattern::new(
            "agent_settings_tamper",
            r"(?i)((^|[;&|]\s*)(echo|printf|tee|sed|mv|cp)\b[^;|&]*\.claude/settings(\.local)?\.json)|(>\s*\S*\.claude/settings(\.local)?\.json)",
            Severity::Critical,
            "direct overwrite of the host agent's settings file",
            "Rewriting the settings file can silently deregister this guard's hook.",
            &["the operator editing settings deliberately"],
        ),
    ]
}

/// First matching high-risk pattern, or `None`. Matching is non-global and
/// stateless; there is no lastIndex-style iteration.
pub fn scan_high_risk(command: &str) -> Option<&'static RiskPattern> {
    HIGH_RISK.iter().find(|p| p.is_match(command))
}
