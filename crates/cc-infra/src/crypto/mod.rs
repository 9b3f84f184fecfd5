mod age_cipher;

pub use age_cipher::AgeStreamCipher;
