//! Minimal contract bindings for present-time reads.
//!
//! The SDK never decodes historical logs itself (that is the indexer's
//! job); these interfaces cover only the current-state queries the
//! history engine anchors on.

use alloy::sol;

sol! {
    #[sol(rpc)]
    contract Erc20 {
        function balanceOf(address owner) external view returns (uint256);
        function decimals() external view returns (uint8);
    }

    #[sol(rpc)]
    contract OptionVault {
        struct PositionView {
            uint64 id;
            uint8 side;
            uint256 size;
            uint256 collateral;
        }

        function getOwnerPositions(address owner) external view returns (PositionView[] memory);
        function sizeDecimals() external view returns (uint8);
        function collateralDecimals() external view returns (uint8);
    }
}
