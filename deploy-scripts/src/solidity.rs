//! Definitions of Solidity functions called during deployment

use alloy::sol;

sol! {
    /// The upgrade surface of a UUPS implementation, as seen through its proxy.
    ///
    /// OpenZeppelin 5.x drops `upgradeTo` and exposes `UPGRADE_INTERFACE_VERSION`;
    /// 4.x has `upgradeTo` and no version getter.
    #[sol(rpc)]
    interface IUUPSUpgradeable {
        function UPGRADE_INTERFACE_VERSION() external view returns (string memory);
        function upgradeTo(address newImplementation) external;
        function upgradeToAndCall(address newImplementation, bytes memory data) external payable;
    }
}
