use rand::Rng;

/// 生成6位数字验证码，范围 100000..=999999
pub fn generate_six_digit_code() -> String {
    let mut rng = rand::thread_rng();
    rng.gen_range(100000..=999999u32).to_string()
}
