use anyhow::Result;

/// Generate an opaque account password: 8 random bytes, hex-encoded.
/// The plaintext exists only long enough to hash and to email.
pub fn generate_password() -> Result<String> {
    let mut buf = [0u8; 8];
    getrandom::getrandom(&mut buf)
        .map_err(|e| anyhow::anyhow!("OS RNG unavailable: {}", e))?;
    Ok(buf.iter().map(|b| format!("{:02x}", b)).collect())
}

/// Generate a 6-digit numeric OTP code (100000..=999999).
pub fn generate_otp_code() -> Result<String> {
    let mut buf = [0u8; 4];
    getrandom::getrandom(&mut buf)
        .map_err(|e| anyhow::anyhow!("OS RNG unavailable: {}", e))?;
    let n = u32::from_be_bytes(buf);
    Ok(format!("{}", 100_000 + n % 900_000))
}
