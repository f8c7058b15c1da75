/// Defines a unit type naming an independent random stream. The name is hashed into the seed
/// offset, so two streams with different names never share a sequence for the same base seed.
///
/// ```rust
/// use mobility_seir::define_rng;
/// use mobility_seir::random::named_rng;
/// use mobility_seir::rand::Rng;
///
/// define_rng!(ShuffleRng);
///
/// let mut rng = named_rng::<ShuffleRng>(42);
/// let _value: f64 = rng.random();
/// ```
#[macro_export]
macro_rules! define_rng {
    ($random_id:ident) => {
        #[derive(Copy, Clone, Debug)]
        pub struct $random_id;

        impl $crate::random::RngId for $random_id {
            type RngType = $crate::rand::rngs::SmallRng;

            fn get_name() -> &'static str {
                stringify!($random_id)
            }
        }
    };
}
pub use define_rng;
