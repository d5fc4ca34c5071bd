mod test_dataset;


pub const TEST_SEED: u64 = 294845;
