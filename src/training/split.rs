use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// 按固定种子打乱后切分为 (训练集, 测试集)
///
/// 测试集大小为 `ceil(n * (1 - train_ratio))`，其余为训练集；
/// 样本数不少于2且比例小于1时两侧都至少保留一个。
pub fn split_train_test<T>(mut samples: Vec<T>, train_ratio: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total = samples.len();
    // 扣除 1 - 0.7 这类浮点误差
    let test_len = ((total as f64) * (1.0 - train_ratio) - 1e-9).ceil().max(0.0) as usize;
    let mut split_at = total.saturating_sub(test_len);
    if total >= 2 && train_ratio < 1.0 {
        split_at = split_at.clamp(1, total - 1);
    }

    let test = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} held out (seed {})",
        samples.len(),
        test.len(),
        seed
    );

    (samples, test)
}
