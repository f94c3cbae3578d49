use std::env;

/// 布尔型环境开关。接受 true/1（大小写不敏感），其余值与未设置都取default
pub fn env_is_true(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => {
            let v = v.trim();
            v.eq_ignore_ascii_case("true") || v == "1"
        }
        Err(_) => default,
    }
}

/// 字符串环境变量，未设置时用default
pub fn env_or_default(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(v) => v,
        Err(_) => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_is_true() {
        env::set_var("ENV_FLAG_TEST_A", "TRUE");
        env::set_var("ENV_FLAG_TEST_B", "0");
        assert!(env_is_true("ENV_FLAG_TEST_A", false));
        assert!(!env_is_true("ENV_FLAG_TEST_B", true));
        // 未设置时取default
        assert!(env_is_true("ENV_FLAG_TEST_MISSING", true));
        env::remove_var("ENV_FLAG_TEST_A");
        env::remove_var("ENV_FLAG_TEST_B");
    }

    #[test]
    fn test_env_or_default() {
        env::set_var("ENV_STR_TEST", "redis://10.0.0.1/");
        assert_eq!(env_or_default("ENV_STR_TEST", "x"), "redis://10.0.0.1/");
        assert_eq!(env_or_default("ENV_STR_TEST_MISSING", "fallback"), "fallback");
        env::remove_var("ENV_STR_TEST");
    }
}
