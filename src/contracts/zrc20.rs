//! ZRC20 contract bindings
//!
//! Bridged foreign-chain assets live on the bridge chain as ZRC20 tokens. Burning
//! one through `withdraw` emits the `Withdrawal` event the relay turns into an
//! outbound CCTX toward the asset's home chain.

use alloy_sol_types::sol;

sol!(
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    interface ZRC20 {
        event Withdrawal(address indexed from, bytes to, uint256 value);

        function withdraw(bytes to, uint256 amount) external returns (bool);
    }
);
